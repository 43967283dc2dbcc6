//! Prompt-to-scenes generation.
//!
//! One text-generation round trip produces every scene. The reply is split on
//! [`SCENE_SEPARATOR`], each fragment loses its leading "Scene <n>" label, and
//! the list is truncated or padded to exactly the requested count.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use reel_ai_client::TextGenerator;
use reel_models::validate_scene_count;
use tracing::{info, warn};

use crate::error::{ReelError, ReelResult};

/// Token the model is asked to put between scenes.
pub const SCENE_SEPARATOR: &str = "#######";

/// System instruction sent with every scene request.
pub const SYSTEM_INSTRUCTIONS: &str = "You are a short scene generator which generates \
descriptive scenes to be used as prompts for AI video generation.";

const CLARIFICATION: &str = "Important Instructions:
- If the prompt is not clear, just return the text ERROR.
- Return each of the scenes separated by #######
- Each scene starts with Scene number, do not put a colon after the number
- Be very descriptive about everything in each scene
- Each scene must somehow relate to the last unless there is only 1 scene
- The scenes are to be used as prompts for an AI video generator, there will be no audio
- Each scene must be treated as a different AI prompt, the AI will not remember previous prompts
- Be very descriptive about recurring characters so they look the same in separate scenes; re-describe the same characters in every scene they appear in, using the same description
";

static SCENE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*scene\s+\d+\s*[:.]?").expect("scene label pattern is valid")
});

/// User message for a request of `count` scenes.
pub fn build_instructions(prompt: &str, count: usize) -> String {
    format!(
        "Generate {} short scenes based on the following prompt: {}\n{}",
        count,
        prompt.trim(),
        CLARIFICATION
    )
}

/// Split a raw reply into cleaned scene texts.
///
/// Blank fragments are dropped.
pub fn split_scenes(raw: &str) -> Vec<String> {
    raw.split(SCENE_SEPARATOR)
        .filter(|fragment| !fragment.trim().is_empty())
        .map(|fragment| SCENE_LABEL.replace(fragment, "").trim().to_string())
        .collect()
}

/// Truncate or pad `scenes` to exactly `count` entries.
///
/// Missing entries become `[Scene k text missing]` with a 1-based `k`.
pub fn pad_scenes(mut scenes: Vec<String>, count: usize) -> Vec<String> {
    scenes.truncate(count);
    let present = scenes.len();
    scenes.extend((present + 1..=count).map(|k| format!("[Scene {} text missing]", k)));
    scenes
}

/// Turns a prompt into an ordered list of scene descriptions.
pub struct SceneGenerator {
    text: Arc<dyn TextGenerator>,
}

impl SceneGenerator {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    /// Generate exactly `count` scene texts for `prompt`.
    ///
    /// A short reply is padded rather than rejected. A failed text request
    /// fails the whole operation.
    pub async fn generate(&self, prompt: &str, count: usize) -> ReelResult<Vec<String>> {
        if prompt.trim().is_empty() {
            return Err(ReelError::input("Prompt is empty"));
        }
        validate_scene_count(count)?;

        let reply = self
            .text
            .ask(&build_instructions(prompt, count), SYSTEM_INSTRUCTIONS)
            .await?;

        let scenes = split_scenes(&reply);
        if scenes.len() != count {
            warn!(
                requested = count,
                received = scenes.len(),
                "Scene count mismatch in generated text"
            );
        }
        info!(count, "Generated scene texts");

        Ok(pad_scenes(scenes, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_ai_client::{AiError, AiResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CannedText {
        reply: Result<String, u16>,
        calls: AtomicUsize,
        last_user_text: Mutex<String>,
    }

    impl CannedText {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_user_text: Mutex::new(String::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
                last_user_text: Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CannedText {
        async fn ask(&self, user_text: &str, _system: &str) -> AiResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user_text.lock().unwrap() = user_text.to_string();
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(status) => Err(AiError::request_failed(*status, "unavailable")),
            }
        }
    }

    #[test]
    fn test_split_strips_labels() {
        assert_eq!(
            split_scenes("Scene 1 A city.#######Scene 2 A forest."),
            vec!["A city.", "A forest."]
        );
    }

    #[test]
    fn test_split_drops_blank_fragments() {
        let raw = "#######\n SCENE 3: The harbour. \n#######   #######scene 4 Night falls.";
        assert_eq!(split_scenes(raw), vec!["The harbour.", "Night falls."]);
    }

    #[test]
    fn test_split_keeps_unlabelled_text() {
        assert_eq!(split_scenes("A quiet field."), vec!["A quiet field."]);
    }

    #[test]
    fn test_pad_and_truncate() {
        let padded = pad_scenes(vec!["A".to_string()], 3);
        assert_eq!(
            padded,
            vec!["A", "[Scene 2 text missing]", "[Scene 3 text missing]"]
        );

        let truncated = pad_scenes(vec!["A".into(), "B".into(), "C".into()], 2);
        assert_eq!(truncated, vec!["A", "B"]);
    }

    #[test]
    fn test_instructions_embed_count_and_prompt() {
        let text = build_instructions("  a lighthouse keeper  ", 4);
        assert!(text.starts_with(
            "Generate 4 short scenes based on the following prompt: a lighthouse keeper\n"
        ));
        assert!(text.contains("separated by #######"));
    }

    #[tokio::test]
    async fn test_generate_returns_exact_count() {
        let text = CannedText::ok("Scene 1 One.#######Scene 2 Two.");
        let generator = SceneGenerator::new(text.clone());

        for count in 1..=10 {
            let scenes = generator.generate("a story", count).await.unwrap();
            assert_eq!(scenes.len(), count);
            for (i, scene) in scenes.iter().enumerate().skip(2) {
                assert_eq!(scene, &format!("[Scene {} text missing]", i + 1));
            }
        }
        assert_eq!(text.calls.load(Ordering::SeqCst), 10);
        assert!(text
            .last_user_text
            .lock()
            .unwrap()
            .starts_with("Generate 10 short scenes"));
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_input_without_calling() {
        let text = CannedText::ok("Scene 1 One.");
        let generator = SceneGenerator::new(text.clone());

        assert!(matches!(
            generator.generate("   ", 2).await,
            Err(ReelError::Input(_))
        ));
        assert!(matches!(
            generator.generate("story", 0).await,
            Err(ReelError::Params(_))
        ));
        assert!(matches!(
            generator.generate("story", 11).await,
            Err(ReelError::Params(_))
        ));
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_propagates_text_failure() {
        let generator = SceneGenerator::new(CannedText::failing(401));
        let err = generator.generate("story", 3).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Upstream);
    }
}
