use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_plain_text() {
    assert!(SlashCommand::parse("reverse a linked list").is_none());
}
#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}

#[test]
fn it_is_quit() {
    for text in ["/q", "/quit", "/exit"] {
        assert!(SlashCommand::parse(text).unwrap().is_quit());
    }
}
#[test]
fn it_is_not_quit() {
    let cmd = SlashCommand::parse("/close").unwrap();
    assert!(!cmd.is_quit());
}

#[test]
fn it_is_image_with_path() {
    let cmd = SlashCommand::parse("/image ./board.png").unwrap();
    assert!(cmd.is_image());
    assert_eq!(cmd.text(), "./board.png");
}
#[test]
fn it_is_short_image() {
    let cmd = SlashCommand::parse("/i a.png").unwrap();
    assert!(cmd.is_image());
    assert!(!cmd.is_remove_image());
}

#[test]
fn it_is_alternative() {
    let cmd = SlashCommand::parse("/alt optimized").unwrap();
    assert!(cmd.is_alternative());
    assert_eq!(cmd.args, vec!["optimized".to_string()]);
}

#[test]
fn it_is_prompt_not_prompts() {
    let cmd = SlashCommand::parse("/prompt 2").unwrap();
    assert!(cmd.is_prompt());
    assert!(!cmd.is_prompts());

    let cmd = SlashCommand::parse("/prompts").unwrap();
    assert!(cmd.is_prompts());
    assert!(!cmd.is_prompt());
}

#[test]
fn it_is_copy_with_and_without_index() {
    assert!(SlashCommand::parse("/c").unwrap().is_copy());
    assert!(SlashCommand::parse("/copy 2").unwrap().is_copy());
}

#[test]
fn it_keeps_the_suggest_text() {
    let cmd = SlashCommand::parse("/suggest   two   sum ").unwrap();
    assert!(cmd.is_suggest());
    assert_eq!(cmd.text(), "two sum");
}

#[test]
fn it_parses_one_based_indexes() {
    let cmd = SlashCommand::parse("/pick 3").unwrap();
    assert_eq!(cmd.index().unwrap(), 2);
}
#[test]
fn it_rejects_zero_and_missing_indexes() {
    assert!(SlashCommand::parse("/pick 0").unwrap().index().is_err());
    assert!(SlashCommand::parse("/pick").unwrap().index().is_err());
    assert!(SlashCommand::parse("/pick one").unwrap().index().is_err());
}

#[test]
fn it_is_help() {
    let cmd = SlashCommand::parse("/help").unwrap();
    assert!(cmd.is_help());
}
#[test]
fn it_is_not_help() {
    let cmd = SlashCommand::parse("/save").unwrap();
    assert!(!cmd.is_help());
    assert!(cmd.is_save());
}
