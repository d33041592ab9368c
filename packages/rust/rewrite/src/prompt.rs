//! Prompt construction for the rewrite task.

use articlelift_extract::truncate_chars;
use articlelift_shared::{Article, ReferenceArticle};

/// Build the single user-message prompt for a rewrite.
///
/// Embeds the original title and content verbatim and each reference's
/// title plus a content excerpt capped at `excerpt_max_chars` characters,
/// then the task instructions. The model is told to return only the
/// rewritten body in markdown, with no preamble.
pub fn build_prompt(article: &Article, references: &[ReferenceArticle], excerpt_max_chars: usize) -> String {
    let mut ref_sections = String::new();
    for (i, reference) in references.iter().enumerate() {
        let excerpt = truncate_chars(&reference.content, excerpt_max_chars);
        ref_sections.push_str(&format!(
            "\nReference Article {}:\nTitle: {}\nContent: {}\n",
            i + 1,
            reference.title,
            excerpt,
        ));
    }

    format!(
        "You are a professional content writer and SEO expert. You have an original \
blog article and reference articles that rank well on search engines.

ORIGINAL ARTICLE:
Title: {title}
Content: {content}

REFERENCE ARTICLES THAT RANK WELL:
{ref_sections}
TASK:
Rewrite and enhance the original article by learning from the reference articles' \
structure, formatting, and style.

Requirements:
1. Keep the core message and topic of the original article
2. Improve structure with clear headings and sections
3. Enhance readability with better paragraphs and flow
4. Add professional formatting (use markdown)
5. Make it SEO-friendly
6. Improve the writing quality and tone
7. Expand the content where needed for better depth
8. Use bullet points or numbered lists where appropriate

Provide ONLY the enhanced article content in markdown format. Do not include \
any preamble or explanation.",
        title = article.title,
        content = article.content,
        ref_sections = ref_sections,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            id: 1.into(),
            title: "Why chatbots matter".into(),
            content: "They answer instantly.".into(),
            url: None,
            image_url: None,
            is_updated: false,
            updated_content: None,
            references: vec![],
        }
    }

    #[test]
    fn embeds_original_verbatim() {
        let prompt = build_prompt(&article(), &[], 1500);
        assert!(prompt.contains("Title: Why chatbots matter"));
        assert!(prompt.contains("Content: They answer instantly."));
        assert!(prompt.contains("ONLY the enhanced article content"));
    }

    #[test]
    fn numbers_references_in_order() {
        let refs = vec![
            ReferenceArticle {
                title: "First ref".into(),
                url: "https://a".into(),
                content: "alpha".into(),
            },
            ReferenceArticle {
                title: "Second ref".into(),
                url: "https://b".into(),
                content: "beta".into(),
            },
        ];
        let prompt = build_prompt(&article(), &refs, 1500);
        let first = prompt.find("Reference Article 1:").expect("first");
        let second = prompt.find("Reference Article 2:").expect("second");
        assert!(first < second);
        assert!(prompt.contains("Title: First ref"));
        assert!(prompt.contains("Content: beta"));
    }

    #[test]
    fn reference_excerpts_are_truncated() {
        let refs = vec![ReferenceArticle {
            title: "Long".into(),
            url: "https://l".into(),
            content: "y".repeat(5000),
        }];
        let prompt = build_prompt(&article(), &refs, 1500);
        assert!(prompt.contains(&"y".repeat(1500)));
        assert!(!prompt.contains(&"y".repeat(1501)));
    }
}
