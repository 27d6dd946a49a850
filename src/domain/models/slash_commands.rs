#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }

        let prefix = args.remove(0);
        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_image()
            || cmd.is_remove_image()
            || cmd.is_language()
            || cmd.is_session()
            || cmd.is_suggest()
            || cmd.is_pick()
            || cmd.is_search()
            || cmd.is_alternative()
            || cmd.is_follow_up()
            || cmd.is_prompts()
            || cmd.is_prompt()
            || cmd.is_close()
            || cmd.is_copy()
            || cmd.is_save()
            || cmd.is_note()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn name(&self) -> &str {
        return &self.command;
    }

    /// Everything after the command, as typed.
    pub fn text(&self) -> String {
        return self.args.join(" ");
    }

    /// Parses the first argument as a 1-based index and returns it 0-based.
    pub fn index(&self) -> Result<usize> {
        let Some(arg) = self.args.first() else {
            bail!("{} needs a number", self.command);
        };

        let idx = arg.parse::<usize>()?;
        if idx == 0 {
            bail!("Numbers start at 1");
        }

        return Ok(idx - 1);
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_image(&self) -> bool {
        return ["/i", "/image"].contains(&self.command.as_str());
    }

    pub fn is_remove_image(&self) -> bool {
        return ["/ri", "/rmimage"].contains(&self.command.as_str());
    }

    pub fn is_language(&self) -> bool {
        return ["/l", "/lang"].contains(&self.command.as_str());
    }

    pub fn is_session(&self) -> bool {
        return ["/s", "/session"].contains(&self.command.as_str());
    }

    pub fn is_suggest(&self) -> bool {
        return ["/sg", "/suggest"].contains(&self.command.as_str());
    }

    pub fn is_pick(&self) -> bool {
        return ["/pick"].contains(&self.command.as_str());
    }

    pub fn is_search(&self) -> bool {
        return ["/search"].contains(&self.command.as_str());
    }

    pub fn is_alternative(&self) -> bool {
        return ["/alt", "/alternative"].contains(&self.command.as_str());
    }

    pub fn is_follow_up(&self) -> bool {
        return ["/f", "/followup"].contains(&self.command.as_str());
    }

    pub fn is_prompts(&self) -> bool {
        return ["/prompts"].contains(&self.command.as_str());
    }

    pub fn is_prompt(&self) -> bool {
        return ["/p", "/prompt"].contains(&self.command.as_str());
    }

    pub fn is_close(&self) -> bool {
        return ["/close"].contains(&self.command.as_str());
    }

    pub fn is_copy(&self) -> bool {
        return ["/c", "/copy"].contains(&self.command.as_str());
    }

    pub fn is_save(&self) -> bool {
        return ["/save"].contains(&self.command.as_str());
    }

    pub fn is_note(&self) -> bool {
        return ["/n", "/note"].contains(&self.command.as_str());
    }
}

pub const HELP_TEXT: &str = r#"
Type a question to search, or to ask a follow-up while a conversation is open.

- /image [PATH] (/i) - Attach an image to the next search or follow-up.
- /rmimage [N] (/ri) - Remove an attached image.
- /lang [LANGUAGE] (/l) - Set the language filter, "all" for any.
- /session [ID] (/s) - Select a session. Without an ID, pick from a list.
- /suggest [TEXT] (/sg) - Show question suggestions for TEXT.
- /pick [N] - Use suggestion N as the query.
- /search [TEXT] - Search, even while a conversation is open.
- /alt [optimized|simplified|different] - Generate an alternative approach.
- /followup (/f) - Open a follow-up conversation on the current result.
- /prompts - List quick follow-up prompts.
- /prompt [N] (/p) - Send quick prompt N.
- /close - Close the follow-up conversation.
- /copy [N] (/c) - Copy all displayed code, or only block N.
- /save - Submit the current solution for approval.
- /note [TEXT] (/n) - Add a note to the current session.
- /help (/h) - Show this help.
- /quit (/q) - Exit.
"#;
