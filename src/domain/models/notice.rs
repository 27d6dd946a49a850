use owo_colors::OwoColorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A transient message for the user, the terminal version of a toast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: &str) -> Notice {
        return Notice {
            level: NoticeLevel::Success,
            text: text.to_string(),
        };
    }

    pub fn error(text: &str) -> Notice {
        return Notice {
            level: NoticeLevel::Error,
            text: text.to_string(),
        };
    }

    pub fn info(text: &str) -> Notice {
        return Notice {
            level: NoticeLevel::Info,
            text: text.to_string(),
        };
    }

    pub fn is_error(&self) -> bool {
        return self.level == NoticeLevel::Error;
    }

    pub fn colored(&self) -> String {
        match self.level {
            NoticeLevel::Success => return format!("{} {}", "✔".green(), self.text),
            NoticeLevel::Error => return format!("{} {}", "✘".red(), self.text.red()),
            NoticeLevel::Info => return format!("{} {}", "•".blue(), self.text),
        }
    }
}
