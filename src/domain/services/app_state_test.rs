use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use tokio::sync::mpsc;

use super::AppState;
use super::Focus;
use super::Output;
use super::COPIED;
use super::COPY_FAILED;
use super::SAVED;
use super::SAVE_FAILED;
use crate::domain::models::ApiBox;
use crate::domain::models::ApiError;
use crate::domain::models::ChatTurn;
use crate::domain::models::Event;
use crate::domain::models::FollowUpType;
use crate::domain::models::Notice;
use crate::domain::models::SearchRequest;
use crate::domain::services::fake_api::Call;
use crate::domain::services::fake_api::FakeApi;
use crate::domain::services::ALTERNATIVE_FAILED;
use crate::domain::services::FOLLOW_UP_FAILED;
use crate::domain::services::SEARCH_FAILED;

fn app_with(fake: &Arc<FakeApi>, session_id: Option<&str>) -> AppState {
    let (tx, _rx) = mpsc::unbounded_channel::<Event>();
    let api: ApiBox = fake.clone();

    return AppState::new(
        api,
        tx,
        "all",
        session_id.map(|e| return e.to_string()),
        Duration::from_millis(300),
    )
    .with_clipboard(|_| return Ok(()));
}

fn app(fake: &Arc<FakeApi>) -> AppState {
    return app_with(fake, Some("S1"));
}

fn error(text: &str) -> Output {
    return Output::Notice(Notice::error(text));
}

async fn searched(fake: &Arc<FakeApi>) -> AppState {
    let mut state = app(fake);
    let res = state.handle_input("reverse a linked list").await;
    assert_eq!(res, vec![Output::Response]);
    return state;
}

mod search {
    use super::*;

    #[tokio::test]
    async fn it_searches_with_the_selected_session() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app_with(&fake, None);

        assert_eq!(
            state.handle_input("/session S1").await,
            vec![Output::Notice(Notice::info("Using session S1"))]
        );
        let res = state.handle_input("reverse a linked list").await;

        assert_eq!(res, vec![Output::Response]);
        assert_eq!(
            fake.calls(),
            vec![Call::Search(SearchRequest {
                query: "reverse a linked list".to_string(),
                language_filter: "all".to_string(),
                session_id: "S1".to_string(),
                images: vec![],
            })]
        );
        assert_eq!(state.search.query, "");
        assert_eq!(
            state.search.response.as_ref().unwrap().question_text,
            "Reverse a singly linked list"
        );
        assert_eq!(state.focus, Focus::Search);
    }

    #[tokio::test]
    async fn it_requires_a_session_without_calling_the_api() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app_with(&fake, None);

        let res = state.handle_input("reverse a linked list").await;

        assert_eq!(res, vec![error("Please select or create a session")]);
        assert!(fake.calls().is_empty());
        assert_eq!(state.search.query, "reverse a linked list");
    }

    #[tokio::test]
    async fn it_requires_a_query_or_image() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        let res = state.handle_input("/search").await;

        assert_eq!(res, vec![error("Please enter a query or upload an image")]);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn it_keeps_the_query_when_the_backend_fails() {
        let fake = Arc::new(FakeApi::failing(&["search"]));
        let mut state = app(&fake);

        let res = state.handle_input("reverse a linked list").await;

        assert_eq!(res, vec![error(SEARCH_FAILED)]);
        assert_eq!(state.search.query, "reverse a linked list");
        assert_eq!(state.search.error, Some(SEARCH_FAILED.to_string()));
        assert!(state.search.response.is_none());
    }

    #[tokio::test]
    async fn it_resets_when_unauthorized() {
        let fake = Arc::new(FakeApi {
            unauthorized: true,
            ..FakeApi::default()
        });
        let mut state = app(&fake);

        let res = state.handle_input("reverse a linked list").await;

        assert_eq!(res, vec![error(&ApiError::Unauthorized.to_string())]);
        assert_eq!(state.search.query, "");
        assert_eq!(state.focus, Focus::None);
    }

    #[tokio::test]
    async fn it_closes_the_conversation_and_drops_the_alternative() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        state.handle_input("/alt optimized").await;
        state.handle_input("/followup").await;
        assert!(state.alternatives.response.is_some());
        assert!(state.follow_up.is_open());

        let res = state.handle_input("/search two sum").await;

        assert_eq!(res, vec![Output::Response]);
        assert!(!state.follow_up.is_open());
        assert!(state.alternatives.response.is_none());
        assert_eq!(state.focus, Focus::Search);
    }
}

mod images {
    use super::*;

    fn temp_dir() -> std::path::PathBuf {
        return std::env::temp_dir().join(format!("codequest-images-{}", uuid::Uuid::new_v4()));
    }

    #[tokio::test]
    async fn it_attaches_images_to_the_search_form() -> Result<()> {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("board.png");
        tokio::fs::write(&path, [137, 80, 78, 71]).await?;

        let res = state
            .handle_input(&format!("/image {}", path.to_string_lossy()))
            .await;

        assert_eq!(res, vec![Output::Images]);
        assert_eq!(state.search.images.len(), 1);
        assert_eq!(state.urls.len(), 1);

        assert_eq!(state.handle_input("/rmimage 1").await, vec![Output::Images]);
        assert!(state.search.images.is_empty());
        assert!(state.urls.is_empty());

        tokio::fs::remove_dir_all(&dir).await?;
        return Ok(());
    }

    #[tokio::test]
    async fn it_rejects_oversized_images_before_uploading() -> Result<()> {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("huge.png");
        tokio::fs::write(&path, vec![0u8; 12 * 1024 * 1024]).await?;

        let res = state
            .handle_input(&format!("/image {}", path.to_string_lossy()))
            .await;

        assert_eq!(
            res,
            vec![error("File huge.png is too large (max 10MB)"), Output::Images]
        );
        assert!(state.search.images.is_empty());
        assert!(fake.calls().is_empty());

        tokio::fs::remove_dir_all(&dir).await?;
        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_unreadable_paths() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        let res = state.handle_input("/image /nowhere/board.png").await;

        assert_eq!(
            res,
            vec![error("Could not read /nowhere/board.png"), Output::Images]
        );
    }

    #[tokio::test]
    async fn it_reports_missing_images_on_removal() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(
            state.handle_input("/rmimage 2").await,
            vec![error("2 is out of bounds.")]
        );
    }
}

mod alternatives {
    use super::*;

    #[tokio::test]
    async fn it_generates_an_alternative_from_the_displayed_answer() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        let res = state.handle_input("/alt simplified").await;

        assert_eq!(res, vec![Output::Alternative]);
        assert_eq!(state.focus, Focus::Alternative);
        assert_eq!(
            state.alternatives.response.as_ref().unwrap().explanation,
            "Simplified Approach version"
        );

        let Some(Call::Alternative(req)) = fake.calls().pop() else {
            panic!("expected an alternative request");
        };
        assert_eq!(req.language, "python");
        assert_eq!(req.current_code, "Reverse a singly linked list");
        assert_eq!(req.session_id, Some("S1".to_string()));
    }

    #[tokio::test]
    async fn it_uses_the_selected_session() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        state.handle_input("/session S2").await;
        assert_eq!(
            state.handle_input("/alt optimized").await,
            vec![Output::Alternative]
        );

        let Some(Call::Alternative(req)) = fake.calls().pop() else {
            panic!("expected an alternative request");
        };
        assert_eq!(req.session_id, Some("S2".to_string()));
    }

    #[tokio::test]
    async fn it_respects_results_without_alternatives() {
        let mut fake = FakeApi::default();
        fake.response.can_generate_alternative = false;
        let fake = Arc::new(fake);
        let mut state = searched(&fake).await;

        assert_eq!(
            state.handle_input("/alt optimized").await,
            vec![error("Alternative approaches are not available for this result")]
        );
        assert_eq!(fake.calls().len(), 1);
        assert!(state.alternatives.response.is_none());
        assert_eq!(state.focus, Focus::Search);
    }

    #[tokio::test]
    async fn it_needs_a_response_first() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(
            state.handle_input("/alt optimized").await,
            vec![error("There is no response to work with yet")]
        );
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn it_rejects_unknown_approaches() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        let res = state.handle_input("/alt original").await;

        assert_eq!(
            res,
            vec![error(
                "original is not an alternative approach. Use optimized, simplified or different"
            )]
        );
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn it_reports_failed_generation() {
        let fake = Arc::new(FakeApi::failing(&["generate-alternative"]));
        let mut state = searched(&fake).await;

        let res = state.handle_input("/alt different").await;

        assert_eq!(res, vec![error(ALTERNATIVE_FAILED)]);
        assert!(!state.alternatives.is_busy());
        assert_eq!(state.focus, Focus::Search);
    }
}

mod follow_up {
    use super::*;

    #[tokio::test]
    async fn it_answers_a_quick_prompt() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        assert_eq!(
            state.handle_input("/followup").await,
            vec![Output::Transcript]
        );
        let res = state.handle_input("/prompt 1").await;

        assert_eq!(res, vec![Output::Answer]);
        let transcript = state.follow_up.transcript();
        assert_eq!(transcript.len(), 3);
        assert!(matches!(transcript[0], ChatTurn::Original { .. }));
        assert_eq!(
            transcript[1],
            ChatTurn::Question {
                text: "Can you optimize the time complexity?".to_string(),
                images: vec![],
            }
        );
        assert!(matches!(transcript[2], ChatTurn::Answer { .. }));
        assert_eq!(state.focus, Focus::Turn(2));

        let Some(Call::ContinueChat(req)) = fake.calls().pop() else {
            panic!("expected a follow-up request");
        };
        assert_eq!(req.approach_type, FollowUpType::TimeComplexity);
        assert_eq!(req.follow_up_question, "Can you optimize the time complexity?");
        assert_eq!(req.session_id, Some("S1".to_string()));
    }

    #[tokio::test]
    async fn it_rolls_back_a_failed_prompt() {
        let fake = Arc::new(FakeApi::failing(&["continue-chat"]));
        let mut state = searched(&fake).await;
        state.handle_input("/followup").await;

        let res = state.handle_input("/prompt 1").await;

        assert_eq!(res, vec![error(FOLLOW_UP_FAILED)]);
        assert_eq!(state.follow_up.transcript().len(), 1);
        assert!(matches!(
            state.follow_up.transcript()[0],
            ChatTurn::Original { .. }
        ));
    }

    #[tokio::test]
    async fn it_alternates_questions_and_answers() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;
        state.handle_input("/followup").await;

        state.handle_input("Why a prev pointer?").await;
        state.handle_input("What about recursion?").await;

        let questions = state
            .follow_up
            .transcript()
            .iter()
            .map(|turn| match turn {
                ChatTurn::Original { .. } => return "original".to_string(),
                ChatTurn::Question { text, .. } => return text.to_string(),
                ChatTurn::Answer { .. } => return "answer".to_string(),
            })
            .collect::<Vec<String>>();

        assert_eq!(
            questions,
            vec![
                "original",
                "Why a prev pointer?",
                "answer",
                "What about recursion?",
                "answer"
            ]
        );
        assert_eq!(state.search.query, "");
    }

    #[tokio::test]
    async fn it_loads_prompts_once() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        state.handle_input("/followup").await;
        state.handle_input("/close").await;
        state.handle_input("/followup").await;

        let prompts = fake
            .calls()
            .into_iter()
            .filter(|call| return *call == Call::Prompts)
            .count();
        assert_eq!(prompts, 1);
        assert_eq!(state.follow_up.prompts.len(), 5);
    }

    #[tokio::test]
    async fn it_needs_an_open_conversation_for_prompts() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        assert_eq!(
            state.handle_input("/prompts").await,
            vec![error("Open a follow-up conversation first")]
        );
        assert_eq!(
            state.handle_input("/close").await,
            vec![error("Open a follow-up conversation first")]
        );
    }
}

mod copy {
    use super::*;

    #[tokio::test]
    async fn it_copies_the_displayed_code() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        let res = state.handle_input("/copy").await;

        assert_eq!(res, vec![Output::Notice(Notice::success(COPIED))]);
        assert!(state.copies.is_copied("search-0"));
        assert!(!state.copies.is_copied("alternative-0"));
    }

    #[tokio::test]
    async fn it_copies_answers_by_turn() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;
        state.handle_input("/followup").await;
        state.handle_input("Why a prev pointer?").await;

        let res = state.handle_input("/copy 1").await;

        assert_eq!(res, vec![Output::Notice(Notice::success(COPIED))]);
        assert!(state.copies.is_copied("2-0"));
        assert_eq!(state.codeblocks.blocks()[0].code, "prev = None");
    }

    #[tokio::test]
    async fn it_reports_missing_blocks() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        assert_eq!(
            state.handle_input("/copy 2").await,
            vec![error("2 is out of bounds.")]
        );
        assert_eq!(state.copies.active(), 0);
    }

    #[tokio::test]
    async fn it_does_not_copy_block_zero() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        assert_eq!(
            state.handle_input("/copy 0").await,
            vec![error("0 is out of bounds.")]
        );
        assert_eq!(state.copies.active(), 0);
    }

    #[tokio::test]
    async fn it_has_nothing_to_copy_before_a_search() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(
            state.handle_input("/copy").await,
            vec![error("No code to copy")]
        );
    }

    #[tokio::test]
    async fn it_reports_clipboard_failures() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake)
            .await
            .with_clipboard(|_| return Err(anyhow!("no display")));

        assert_eq!(state.handle_input("/copy").await, vec![error(COPY_FAILED)]);
        assert_eq!(state.copies.active(), 0);
    }
}

mod save {
    use super::*;

    #[tokio::test]
    async fn it_saves_the_displayed_solution() {
        let fake = Arc::new(FakeApi::default());
        let mut state = searched(&fake).await;

        let res = state.handle_input("/save").await;

        assert_eq!(res, vec![Output::Notice(Notice::success(SAVED))]);
        let Some(Call::Approval(req)) = fake.calls().pop() else {
            panic!("expected an approval request");
        };
        assert_eq!(req.difficulty, "medium");
        assert_eq!(req.language, "python");
        assert_eq!(req.search_hash, "9f1c2a");
        assert_eq!(req.image_paths, "[]");
        assert_eq!(req.session_id, Some("S1".to_string()));
    }

    #[tokio::test]
    async fn it_reports_failed_saves() {
        let fake = Arc::new(FakeApi::failing(&["submit-for-approval"]));
        let mut state = searched(&fake).await;

        assert_eq!(state.handle_input("/save").await, vec![error(SAVE_FAILED)]);
    }
}

mod suggestions {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn it_picks_a_fetched_suggestion() {
        let fake = Arc::new(FakeApi::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let api: ApiBox = fake.clone();
        let mut state = AppState::new(api, tx, "all", Some("S1".to_string()), Duration::from_millis(300));

        assert!(state.handle_input("/suggest two sum").await.is_empty());
        assert!(fake.suggestion_queries().is_empty());

        let event = rx.recv().await.unwrap();
        assert_eq!(state.handle_event(event), vec![Output::Suggestions]);
        assert_eq!(fake.suggestion_queries(), vec!["two sum".to_string()]);

        let res = state.handle_input("/pick 1").await;
        assert_eq!(
            res,
            vec![Output::Notice(Notice::info(
                "Query set to \"two sum in place\", use /search to submit it"
            ))]
        );
        assert_eq!(state.search.query, "two sum in place");
        assert!(!state.suggestions.visible);
    }
}

mod commands {
    use super::*;

    #[tokio::test]
    async fn it_quits_and_helps() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(state.handle_input("/q").await, vec![Output::Quit]);
        assert_eq!(state.handle_input("/help").await, vec![Output::Help]);
        assert!(state.handle_input("   ").await.is_empty());
    }

    #[tokio::test]
    async fn it_picks_a_session_when_none_is_given() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(state.handle_input("/session").await, vec![Output::PickSession]);
        assert_eq!(
            state.handle_input("/s S9").await,
            vec![Output::Notice(Notice::info("Using session S9"))]
        );
        assert_eq!(state.search.session_id, Some("S9".to_string()));
    }

    #[tokio::test]
    async fn it_rejects_unknown_commands() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(
            state.handle_input("/bogus now").await,
            vec![error("Unknown command /bogus, try /help")]
        );
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn it_switches_languages() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(
            state.handle_input("/lang go").await,
            vec![Output::Notice(Notice::info("Language filter set to go"))]
        );
        assert_eq!(state.search.language, "go");
        assert_eq!(
            state.handle_input("/lang").await,
            vec![Output::Languages(vec![
                "python".to_string(),
                "javascript".to_string()
            ])]
        );
    }

    #[tokio::test]
    async fn it_adds_and_lists_notes() {
        let fake = Arc::new(FakeApi::default());
        let mut state = app(&fake);

        assert_eq!(
            state.handle_input("/note Strong on pointers").await,
            vec![Output::Notice(Notice::success("Note added"))]
        );
        let Some(Output::Notes(notes)) = state.handle_input("/note").await.pop() else {
            panic!("expected notes");
        };
        assert_eq!(notes[0].content, "Strong on pointers");

        let mut no_session = app_with(&fake, None);
        assert_eq!(
            no_session.handle_input("/note hi").await,
            vec![error("Please select or create a session")]
        );
    }
}
