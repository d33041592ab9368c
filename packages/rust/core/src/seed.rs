//! Seed scraper: bootstrap the article store from a blog listing page.
//!
//! Scrapes the configured listing URL (following pagination to the last
//! page, where the oldest posts live), pulls title/excerpt/link/image out
//! of each post card with selector cascades, and creates the results in
//! the store. When the listing is unreachable or yields nothing usable, a
//! fixed set of sample articles is created instead so the rest of the
//! pipeline always has something to work on.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use articlelift_shared::{ArticleLiftError, NewArticle, Result, SeedConfig};
use articlelift_store::ArticleStore;

use crate::BROWSER_USER_AGENT;

/// Post-card selectors in priority order; first selector with any match
/// wins for the whole page.
const CARD_SELECTORS: [&str; 7] = [
    "article",
    ".blog-post",
    ".post-item",
    ".entry",
    ".post",
    r#"[class*="post"]"#,
    r#"[class*="article"]"#,
];

const TITLE_SELECTORS: [&str; 6] = ["h1", "h2", "h3", ".title", ".entry-title", ".post-title"];

const EXCERPT_SELECTORS: [&str; 5] = ["p", ".excerpt", ".content", ".entry-content", ".post-content"];

static CARD_CASCADE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CARD_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector is valid"))
        .collect()
});

static TITLE_CASCADE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    TITLE_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector is valid"))
        .collect()
});

static EXCERPT_CASCADE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    EXCERPT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector is valid"))
        .collect()
});

static PAGINATION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".pagination a, .page-numbers a").expect("static selector is valid")
});

static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

static IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("static selector is valid"));

/// Summary of a completed seed run.
#[derive(Debug)]
pub struct SeedSummary {
    /// Articles parsed (or sampled) for creation.
    pub attempted: usize,
    /// Articles actually created in the store.
    pub created: usize,
    /// Whether the fixed sample set was used instead of scraped content.
    pub from_fallback: bool,
}

/// Seed the article store from the configured listing page.
///
/// Falls back to sample articles rather than erroring when the listing
/// cannot be scraped; only a broken store config or client fails the call.
#[instrument(skip_all, fields(listing = %config.listing_url))]
pub async fn seed_articles(config: &SeedConfig, store: &ArticleStore) -> Result<SeedSummary> {
    let client = reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .map_err(|e| ArticleLiftError::Network(format!("failed to build HTTP client: {e}")))?;

    let (articles, from_fallback) = match scrape_listing(&client, config).await {
        Ok(articles) if !articles.is_empty() => (articles, false),
        Ok(_) => {
            warn!("listing yielded no usable posts, seeding sample articles");
            (sample_articles(), true)
        }
        Err(e) => {
            warn!(error = %e, "listing scrape failed, seeding sample articles");
            (sample_articles(), true)
        }
    };

    let attempted = articles.len();
    let mut created = 0usize;
    for article in &articles {
        match store.create_article(article).await {
            Ok(stored) => {
                debug!(id = %stored.id, title = %article.title, "seed article created");
                created += 1;
            }
            Err(e) => {
                warn!(title = %article.title, error = %e, "failed to create seed article");
            }
        }
    }

    info!(attempted, created, from_fallback, "seed run complete");
    Ok(SeedSummary {
        attempted,
        created,
        from_fallback,
    })
}

/// Fetch the listing (hopping to the last pagination page when one
/// exists) and parse its post cards.
async fn scrape_listing(client: &reqwest::Client, config: &SeedConfig) -> Result<Vec<NewArticle>> {
    let mut html = fetch_page(client, &config.listing_url).await?;

    if let Some(last_page) = find_last_page(&html, &config.listing_url) {
        debug!(url = %last_page, "following pagination to last page");
        match fetch_page(client, &last_page).await {
            Ok(paged) => html = paged,
            // The first page is still a valid listing.
            Err(e) => warn!(url = %last_page, error = %e, "pagination fetch failed, using first page"),
        }
    }

    Ok(parse_cards(
        &html,
        &config.listing_url,
        config.max_articles,
        config.content_max_chars,
    ))
}

async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ArticleLiftError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ArticleLiftError::Network(format!(
            "{url}: listing returned HTTP {status}"
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ArticleLiftError::Network(format!("{url}: {e}")))
}

/// The href of the last pagination link, absolutized against the listing
/// URL. None when the listing has no pagination.
fn find_last_page(html: &str, base: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let href = doc
        .select(&PAGINATION)
        .last()
        .and_then(|el| el.value().attr("href"))?;
    resolve_url(base, href)
}

/// Parse up to `max_articles` post cards out of a listing page. Cards
/// missing a title or excerpt are dropped.
fn parse_cards(html: &str, base: &str, max_articles: usize, content_max_chars: usize) -> Vec<NewArticle> {
    let doc = Html::parse_document(html);

    let cards: Vec<_> = CARD_CASCADE
        .iter()
        .zip(CARD_SELECTORS)
        .find_map(|(selector, raw)| {
            let matches: Vec<_> = doc.select(selector).collect();
            if matches.is_empty() {
                None
            } else {
                debug!(selector = raw, count = matches.len(), "post cards matched");
                Some(matches)
            }
        })
        .unwrap_or_default();

    let mut articles = Vec::new();
    for card in cards.into_iter().take(max_articles) {
        let title = TITLE_CASCADE
            .iter()
            .find_map(|s| card.select(s).next())
            .map(|el| normalize_text(&el.text().collect::<String>()))
            .unwrap_or_default();

        let excerpt = EXCERPT_CASCADE
            .iter()
            .find_map(|s| card.select(s).next())
            .map(|el| normalize_text(&el.text().collect::<String>()))
            .unwrap_or_default();

        if title.is_empty() || excerpt.is_empty() {
            continue;
        }

        let url = card
            .select(&LINK)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| resolve_url(base, href));

        let image_url = card
            .select(&IMAGE)
            .next()
            .and_then(|el| el.value().attr("src"))
            .and_then(|src| resolve_url(base, src));

        let content = articlelift_extract::truncate_chars(&excerpt, content_max_chars).to_string();
        articles.push(NewArticle {
            title,
            content,
            url,
            image_url,
        });
    }

    articles
}

/// Absolutize a possibly-relative href against the listing URL.
fn resolve_url(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    Url::parse(base)
        .ok()?
        .join(href)
        .ok()
        .map(|u| u.to_string())
}

fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fixed sample set used when the live listing cannot be scraped.
fn sample_articles() -> Vec<NewArticle> {
    let samples = [
        (
            "Understanding AI Chatbots in Customer Service",
            "AI chatbots are revolutionizing customer service by providing instant responses and 24/7 availability. They help businesses scale their support operations while maintaining quality.",
            "https://beyondchats.com/blogs/ai-chatbots",
        ),
        (
            "The Future of Conversational AI",
            "Conversational AI is evolving rapidly with natural language processing and machine learning. Businesses are adopting these technologies to improve customer engagement.",
            "https://beyondchats.com/blogs/conversational-ai",
        ),
        (
            "Best Practices for Chatbot Implementation",
            "Implementing a chatbot requires careful planning and understanding of user needs. This guide covers essential best practices for successful chatbot deployment.",
            "https://beyondchats.com/blogs/chatbot-best-practices",
        ),
        (
            "How Chat Automation Improves Business Efficiency",
            "Chat automation streamlines business operations by handling repetitive queries automatically. This allows human agents to focus on complex issues that require personal attention.",
            "https://beyondchats.com/blogs/chat-automation",
        ),
        (
            "Integrating Chatbots with CRM Systems",
            "Integrating chatbots with CRM systems creates a seamless customer experience. This integration enables better data collection and personalized interactions.",
            "https://beyondchats.com/blogs/chatbot-crm-integration",
        ),
    ];

    samples
        .into_iter()
        .map(|(title, content, url)| NewArticle {
            title: title.to_string(),
            content: content.to_string(),
            url: Some(url.to_string()),
            image_url: None,
        })
        .collect()
}
