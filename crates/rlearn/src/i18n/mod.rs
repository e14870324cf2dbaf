//! Localized log messages.
//!
//! A [`Translator`] is an owned value handed to whoever logs user-facing
//! messages. Keys missing from the dictionary translate to themselves.

use crate::training::ExitReason;
use std::collections::HashMap;

/// Languages with built-in dictionaries
pub const SUPPORTED_LANGS: &[&str] = &["en", "zh"];

const DEFAULT_DICTIONARY: &[(&str, &str, &str)] = &[
    // key, en, zh
    ("exit_reason", "Exit reason", "退出原因"),
    ("checkpoint_saved", "Checkpoint saved", "检查点已保存"),
    ("final_model_saved", "Final model saved", "最终模型已保存"),
    ("early_stopping", "Early stopping", "提前停止"),
    ("should_continue", "Training should continue", "继续训练"),
    ("maximum_episodes_reached", "Maximum episodes reached", "达到最大回合数"),
    ("maximum_total_steps_reached", "Maximum total steps reached", "达到最大总步数"),
    ("maximum_runtime_reached", "Maximum runtime reached", "达到最长运行时间"),
    ("reward_threshold_reached", "Reward threshold reached", "达到奖励阈值"),
    (
        "exceeded_maximum_reward_threshold",
        "Exceeded maximum reward threshold",
        "超过最大奖励阈值",
    ),
    (
        "no_improvement_for_too_long",
        "No improvement for too long",
        "长时间没有改进",
    ),
    ("agent_requested_stop", "Agent requested stop", "智能体请求停止"),
    ("maximum_epochs_reached", "Maximum epochs reached", "达到最大轮数"),
];

/// Key -> language -> text lookup with per-instance overrides.
#[derive(Clone, Debug)]
pub struct Translator {
    lang: String,
    dictionary: HashMap<String, HashMap<String, String>>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Translator {
    /// Translator targeting `lang`, loaded with the built-in dictionary.
    pub fn new(lang: impl Into<String>) -> Self {
        let mut dictionary: HashMap<String, HashMap<String, String>> = HashMap::new();
        for &(key, en, zh) in DEFAULT_DICTIONARY {
            let entry = dictionary.entry(key.to_string()).or_default();
            entry.insert("en".to_string(), en.to_string());
            entry.insert("zh".to_string(), zh.to_string());
        }
        Self {
            lang: lang.into(),
            dictionary,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Translate into the default language.
    pub fn translate(&self, key: &str) -> String {
        self.translate_to(key, &self.lang)
    }

    /// Translate into `lang`, falling back to the key itself.
    pub fn translate_to(&self, key: &str, lang: &str) -> String {
        self.dictionary
            .get(key)
            .and_then(|entries| entries.get(lang))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn exit_reason(&self, reason: ExitReason) -> String {
        self.translate(reason.as_str())
    }

    pub fn add_translation(&mut self, key: &str, lang: &str, text: impl Into<String>) {
        self.dictionary
            .entry(key.to_string())
            .or_default()
            .insert(lang.to_string(), text.into());
    }

    /// Remove one translation; a key left without languages is dropped.
    pub fn remove_translation(&mut self, key: &str, lang: &str) {
        if let Some(entries) = self.dictionary.get_mut(key) {
            entries.remove(lang);
            if entries.is_empty() {
                self.dictionary.remove(key);
            }
        }
    }
}
