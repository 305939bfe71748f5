//! HTML helpers shared by selector-driven sources.

use crate::error::{Error, Result};
use crate::models::ArticleImage;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Compile a CSS selector, keeping the offending text in the error.
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// First element of `document` matching any of `selectors`, tried in order.
pub fn select_first<'a>(document: &'a Html, selectors: &[&Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|sel| document.select(sel).next())
}

/// Trimmed text of an element, text nodes joined without separator.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of `region` with every subtree in `ignored` removed.
///
/// Each non-blank text node becomes one trimmed line, so paragraph and line
/// breaks survive instead of collapsing into a single run of text.
pub fn pruned_text<'a>(region: ElementRef<'a>, ignored: &[ElementRef<'a>]) -> String {
    let mut lines = Vec::new();
    collect_lines(region, ignored, &mut lines);
    lines.join("\n")
}

fn collect_lines<'a>(element: ElementRef<'a>, ignored: &[ElementRef<'a>], out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let line = text.trim();
                if !line.is_empty() {
                    out.push(line.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !ignored.contains(&child) {
                        collect_lines(child, ignored, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_vector_image(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.to_ascii_lowercase().ends_with(".svg")
}

/// Collect images from every `figure_selector` match inside `scope`.
///
/// A wrapping `a[href]` wins over the inline `img[src]` since it usually
/// points at the full-resolution asset. Empty and SVG URLs are dropped.
pub fn collect_images(scope: ElementRef<'_>, figure_selector: &Selector, base: &Url) -> Vec<ArticleImage> {
    let (Ok(link_sel), Ok(img_sel), Ok(caption_sel)) = (
        Selector::parse("a"),
        Selector::parse("img"),
        Selector::parse("figcaption"),
    ) else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for figure in scope.select(figure_selector) {
        let href = figure
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"));
        let src = figure
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"));

        let Some(raw) = href.or(src).map(str::trim).filter(|u| !u.is_empty()) else {
            continue;
        };
        let url = base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string());
        if is_vector_image(&url) {
            continue;
        }

        let caption = figure
            .select(&caption_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        images.push(ArticleImage { url, caption });
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_error_keeps_text() {
        match parse_selector("div[") {
            Err(Error::Selector { selector, .. }) => assert_eq!(selector, "div["),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_pruned_text_drops_ignored_and_keeps_lines() {
        let doc = Html::parse_document(
            r#"<article>
                <p>First paragraph.</p>
                <div class="ad">Buy now!</div>
                <p>Second <b>bold</b> paragraph.</p>
            </article>"#,
        );
        let article = doc.select(&parse_selector("article").unwrap()).next().unwrap();
        let ignored: Vec<_> = article.select(&parse_selector(".ad").unwrap()).collect();

        let text = pruned_text(article, &ignored);
        assert_eq!(text, "First paragraph.\nSecond\nbold\nparagraph.");
    }

    #[test]
    fn test_select_first_uses_fallback() {
        let doc = Html::parse_document(r#"<div class="content__body">Body</div>"#);
        let primary = parse_selector("article").unwrap();
        let fallback = parse_selector(".content__body").unwrap();
        let found = select_first(&doc, &[&primary, &fallback]).unwrap();
        assert_eq!(element_text(found), "Body");
        assert!(select_first(&doc, &[&primary]).is_none());
    }

    #[test]
    fn test_collect_images_prefers_link_and_skips_svg() {
        let doc = Html::parse_document(
            r#"<div class="body">
                <figure><a href="/full/1.jpg"><img src="/thumb/1.jpg"></a><figcaption> One </figcaption></figure>
                <figure><img src="https://cdn.example/2.png"></figure>
                <figure><img src="/icons/logo.SVG"><figcaption>Logo</figcaption></figure>
                <figure><figcaption>No image</figcaption></figure>
            </div>"#,
        );
        let scope = doc.select(&parse_selector(".body").unwrap()).next().unwrap();
        let base = Url::parse("https://news.example/article/1").unwrap();

        let images = collect_images(scope, &parse_selector("figure").unwrap(), &base);
        assert_eq!(
            images,
            vec![
                ArticleImage {
                    url: "https://news.example/full/1.jpg".to_string(),
                    caption: "One".to_string(),
                },
                ArticleImage {
                    url: "https://cdn.example/2.png".to_string(),
                    caption: String::new(),
                },
            ]
        );
    }
}
