//! Prompt renderer: fills language placeholders in a mode template.

use lingogate_core::config::schema::{SOURCE_LANG_TOKEN, TARGET_LANG_TOKEN};

/// Sentinel produced when source-language detection fails.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Substituted for the source token when the language is unknown.
pub const UNKNOWN_LANGUAGE_PHRASE: &str = "the source language";

/// Replace every target/source placeholder in `template`.
///
/// Plain substring replacement; templates are operator-authored and trusted.
pub fn render(template: &str, target_lang: &str, source_lang: &str) -> String {
    let source = if source_lang == UNKNOWN_LANGUAGE {
        UNKNOWN_LANGUAGE_PHRASE
    } else {
        source_lang
    };
    template
        .replace(TARGET_LANG_TOKEN, target_lang)
        .replace(SOURCE_LANG_TOKEN, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_every_occurrence() {
        let out = render(
            "{{SOURCE_LANG}} to {{TARGET_LANG}}; only {{TARGET_LANG}}.",
            "English",
            "es",
        );
        assert_eq!(out, "es to English; only English.");
    }

    #[test]
    fn test_unknown_source_uses_phrase() {
        let out = render("From {{SOURCE_LANG}}.", "English", UNKNOWN_LANGUAGE);
        assert_eq!(out, "From the source language.");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = "Translate {{SOURCE_LANG}} into {{TARGET_LANG}}.";
        assert_eq!(
            render(template, "German", "fr"),
            render(template, "German", "fr")
        );
    }

    #[test]
    fn test_template_without_tokens_is_untouched() {
        assert_eq!(render("Be literal.", "English", "es"), "Be literal.");
        assert_eq!(render("{TARGET_LANG}", "English", "es"), "{TARGET_LANG}");
    }
}
