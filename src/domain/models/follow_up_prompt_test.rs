use super::FollowUpPrompt;
use super::PromptsResponse;
use crate::domain::models::FollowUpType;

#[test]
fn it_has_five_fallback_prompts() {
    let prompts = FollowUpPrompt::fallback();

    assert_eq!(prompts.len(), 5);
    assert_eq!(prompts[0].prompt_type, FollowUpType::TimeComplexity);
    assert_eq!(prompts[0].text, "Can you optimize the time complexity?");
    assert_eq!(prompts[4].prompt_type, FollowUpType::EdgeCase);
    assert_eq!(prompts[4].text, "How would this handle very large inputs?");
}

#[test]
fn it_deserializes_backend_prompts() {
    let res: PromptsResponse = serde_json::from_str(
        r#"{"default_follow_up_prompts": [
            {"type": "space_complexity", "text": "Less memory?"},
            {"type": "readability", "text": "Make it cleaner"}
        ]}"#,
    )
    .unwrap();

    let prompts = res.default_follow_up_prompts.unwrap();
    assert_eq!(prompts[0].prompt_type, FollowUpType::SpaceComplexity);
    assert_eq!(
        prompts[1].prompt_type,
        FollowUpType::Other("readability".to_string())
    );
    assert_eq!(prompts[1].prompt_type.to_string(), "readability");
}

#[test]
fn it_treats_a_missing_prompt_list_as_none() {
    let res: PromptsResponse = serde_json::from_str(r#"{"prompts": []}"#).unwrap();
    assert!(res.default_follow_up_prompts.is_none());
}

#[test]
fn it_defaults_null_and_missing_prompt_types() {
    let res: PromptsResponse = serde_json::from_str(
        r#"{"default_follow_up_prompts": [
            {"type": null, "text": "Walk me through it"},
            {"text": "Any pitfalls?"}
        ]}"#,
    )
    .unwrap();

    let prompts = res.default_follow_up_prompts.unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].prompt_type, FollowUpType::Debugging);
    assert_eq!(prompts[0].text, "Walk me through it");
    assert_eq!(prompts[1].prompt_type, FollowUpType::Debugging);
}
