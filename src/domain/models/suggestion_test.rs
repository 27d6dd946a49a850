use super::Suggestion;
use super::SuggestionType;

#[test]
fn it_deserializes_suggestions() {
    let res: Vec<Suggestion> = serde_json::from_str(
        r#"[
            {"text": "Two sum", "type": "question", "language": "python"},
            {"text": "Binary search", "type": "solution"}
        ]"#,
    )
    .unwrap();

    assert_eq!(res[0].stype, SuggestionType::Question);
    assert_eq!(res[0].language_switch(), Some("python".to_string()));
    assert_eq!(res[1].stype, SuggestionType::Solution);
    assert_eq!(res[1].language_switch(), None);
}

#[test]
fn it_tolerates_null_and_unknown_types() {
    let res: Vec<Suggestion> = serde_json::from_str(
        r#"[
            {"text": "Two sum", "type": null},
            {"text": "LRU cache", "type": "company"},
            {"text": "Tries"}
        ]"#,
    )
    .unwrap();

    assert_eq!(res.len(), 3);
    assert_eq!(res[0].stype, SuggestionType::Question);
    assert_eq!(res[1].stype, SuggestionType::Other);
    assert_eq!(res[1].text, "LRU cache");
    assert_eq!(res[2].stype, SuggestionType::Question);
}

#[test]
fn it_ignores_catch_all_language_switches() {
    let suggestion = Suggestion {
        text: "Heaps".to_string(),
        language: Some("all".to_string()),
        ..Suggestion::default()
    };

    assert_eq!(suggestion.language_switch(), None);
}
