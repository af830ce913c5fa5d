//! Pulls event/deadline pairs and related olympiad links out of listing page markup.
//!
//! Pure functions over markup text; no network or storage access.

use crate::domain::model::{RawToken, RelatedListing};
use crate::utils::error::ExtractError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

static EVENT_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/activity/[^/]+/events").expect("static regex is valid"));

/// The "full schedule" link that trails the event list.
static SENTINEL_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/activity/[^/]+/events/?$").expect("static regex is valid"));

static LISTING_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/activity/\d+$").expect("static regex is valid"));

/// A child node that carries content: elements, and text that is not only whitespace.
enum Child<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

fn significant_children<'a>(element: ElementRef<'a>) -> Vec<Child<'a>> {
    element
        .children()
        .filter_map(|node| {
            if let Some(text) = node.value().as_text() {
                let text: &'a str = text;
                if text.trim().is_empty() {
                    None
                } else {
                    Some(Child::Text(text))
                }
            } else {
                ElementRef::wrap(node).map(Child::Element)
            }
        })
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn href<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().attr("href").unwrap_or_default()
}

/// Label anchors wrap the event name in a child element; only its first text
/// node is the name.
fn event_label(anchor: ElementRef<'_>) -> Option<String> {
    match significant_children(anchor).into_iter().next()? {
        Child::Element(inner) => inner
            .text()
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string),
        Child::Text(_) => None,
    }
}

/// Deadline anchors carry their text directly.
fn deadline_text(anchor: ElementRef<'_>) -> Option<String> {
    match significant_children(anchor).into_iter().next()? {
        Child::Text(text) => Some(text.trim().to_string()),
        Child::Element(_) => None,
    }
}

/// Returns the (event label, deadline text) pairs of a listing page in document order.
///
/// Matching anchors alternate label, deadline, label, deadline... and may be
/// followed by a single "full schedule" link, which is always dropped. What
/// remains must pair up exactly.
pub fn extract_event_tokens(markup: &str) -> Result<Vec<RawToken>, ExtractError> {
    let document = Html::parse_document(markup);

    let mut anchors: Vec<ElementRef<'_>> = document
        .select(&ANCHOR_SELECTOR)
        .filter(|anchor| EVENT_HREF.is_match(href(anchor)))
        .collect();

    if anchors.last().is_some_and(|last| SENTINEL_HREF.is_match(href(last))) {
        anchors.pop();
    }

    if anchors.len() % 2 != 0 {
        return Err(ExtractError::MalformedMarkup {
            message: format!(
                "expected an even number of event anchors, found {}",
                anchors.len()
            ),
        });
    }

    anchors
        .chunks_exact(2)
        .enumerate()
        .map(|(index, pair)| {
            let label = event_label(pair[0]).ok_or_else(|| ExtractError::MalformedMarkup {
                message: format!(
                    "event anchor #{} ({}) has no nested label text",
                    index,
                    href(&pair[0])
                ),
            })?;
            let deadline_text =
                deadline_text(pair[1]).ok_or_else(|| ExtractError::MalformedMarkup {
                    message: format!(
                        "deadline anchor #{} ({}) has no direct text",
                        index,
                        href(&pair[1])
                    ),
                })?;
            Ok(RawToken {
                label,
                deadline_text,
            })
        })
        .collect()
}

/// Returns the other olympiads a listing page links to, in document order.
///
/// The first `/activity/<id>` link is the page's own header and is skipped.
/// Each remaining anchor must hold the olympiad name in its second child
/// element; anything else means the site layout changed. A name seen twice
/// keeps its first position and takes the later link.
pub fn extract_related_listings(markup: &str) -> Result<Vec<RelatedListing>, ExtractError> {
    let document = Html::parse_document(markup);

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut listings: Vec<RelatedListing> = Vec::new();

    for anchor in document
        .select(&ANCHOR_SELECTOR)
        .filter(|anchor| LISTING_HREF.is_match(href(anchor)))
        .skip(1)
    {
        let url = href(&anchor).to_string();
        let name = match significant_children(anchor).into_iter().nth(1) {
            Some(Child::Element(inner)) => element_text(inner),
            _ => String::new(),
        };

        if name.is_empty() {
            return Err(ExtractError::UnrecognizedPageFormat {
                message: format!("related olympiad link {} has no name element", url),
            });
        }

        match positions.get(&name) {
            Some(&index) => listings[index].url = url,
            None => {
                positions.insert(name.clone(), listings.len());
                listings.push(RelatedListing { name, url });
            }
        }
    }

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_pair(id: u32, label: &str, deadline: &str) -> String {
        format!(
            r#"<a href="/activity/5277/events/{id}"><span class="event">{label}</span></a>
               <a href="/activity/5277/events/{id}">{deadline}</a>"#
        )
    }

    #[test]
    fn test_pairs_tokens_in_document_order() {
        let markup = format!(
            "<html><body><div>{}{}</div>\
             <a href=\"/activity/5277/events\">Все события</a></body></html>",
            event_pair(1, "Регистрация", "До 15 окт"),
            event_pair(2, "Отборочный этап", "1 окт...15 ноя"),
        );

        let tokens = extract_event_tokens(&markup).unwrap();

        assert_eq!(
            tokens,
            vec![
                RawToken {
                    label: "Регистрация".to_string(),
                    deadline_text: "До 15 окт".to_string(),
                },
                RawToken {
                    label: "Отборочный этап".to_string(),
                    deadline_text: "1 окт...15 ноя".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_without_sentinel_keeps_all_pairs() {
        let markup = event_pair(7, "Финал", "1 5 мар");
        let tokens = extract_event_tokens(&markup).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].deadline_text, "1 5 мар");
    }

    #[test]
    fn test_ignores_unrelated_links() {
        let markup = format!(
            r#"<a href="/news/12">Новости</a>{}<a href="/activity/5277">Олимпиада</a>"#,
            event_pair(3, "Заключительный этап", "20 24 апр")
        );
        let tokens = extract_event_tokens(&markup).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].label, "Заключительный этап");
    }

    #[test]
    fn test_odd_count_is_malformed() {
        let markup = format!(
            r#"{}<a href="/activity/5277/events/9"><span>Лишнее</span></a>"#,
            event_pair(1, "Регистрация", "До 15 окт")
        );
        assert!(matches!(
            extract_event_tokens(&markup),
            Err(ExtractError::MalformedMarkup { .. })
        ));
    }

    #[test]
    fn test_last_event_missing_deadline_before_sentinel_is_malformed() {
        let markup = format!(
            r#"<div>{}<a href="/activity/1/events/2"><span>Финал</span></a></div>
               <a href="/activity/1/events">Все события</a>"#,
            event_pair(1, "Регистрация", "До 15 окт")
        );
        assert!(matches!(
            extract_event_tokens(&markup),
            Err(ExtractError::MalformedMarkup { .. })
        ));
    }

    #[test]
    fn test_label_is_first_text_node_of_inner_element() {
        let markup = r#"<a href="/activity/1/events/1"><div>Регистрация <span>online</span></div></a>
                        <a href="/activity/1/events/1">До 15 окт</a>"#;
        let tokens = extract_event_tokens(markup).unwrap();
        assert_eq!(tokens[0].label, "Регистрация");
    }

    #[test]
    fn test_label_without_nested_element_is_malformed() {
        let markup = r#"<a href="/activity/1/events/1">Регистрация</a>
                        <a href="/activity/1/events/1">До 15 окт</a>"#;
        assert!(matches!(
            extract_event_tokens(markup),
            Err(ExtractError::MalformedMarkup { .. })
        ));
    }

    #[test]
    fn test_empty_page_has_no_tokens() {
        assert!(extract_event_tokens("<html></html>").unwrap().is_empty());
    }

    #[test]
    fn test_related_listings_skip_header_link() {
        let markup = r#"
            <a href="/activity/5277"><img src="logo.png"><span>Эта олимпиада</span></a>
            <a href="/activity/180">
                <img src="a.png">
                <span>Высшая проба</span>
            </a>
            <a href="/activity/5149"><img src="b.png"><span>Физтех</span></a>
            <a href="/activity/5149/events/1"><span>Не то</span></a>
        "#;

        let related = extract_related_listings(markup).unwrap();

        assert_eq!(
            related,
            vec![
                RelatedListing {
                    name: "Высшая проба".to_string(),
                    url: "/activity/180".to_string(),
                },
                RelatedListing {
                    name: "Физтех".to_string(),
                    url: "/activity/5149".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_related_listing_without_name_element_is_unrecognized() {
        let markup = r#"
            <a href="/activity/5277"><span>Header</span></a>
            <a href="/activity/180">Высшая проба</a>
        "#;
        assert!(matches!(
            extract_related_listings(markup),
            Err(ExtractError::UnrecognizedPageFormat { .. })
        ));
    }

    #[test]
    fn test_related_listings_dedupe_by_name() {
        let markup = r#"
            <a href="/activity/1"><i></i><b>Header</b></a>
            <a href="/activity/2"><i></i><b>Росатом</b></a>
            <a href="/activity/4"><i></i><b>Физтех</b></a>
            <a href="/activity/3"><i></i><b>Росатом</b></a>
        "#;
        let related = extract_related_listings(markup).unwrap();
        let pairs: Vec<(&str, &str)> = related
            .iter()
            .map(|r| (r.name.as_str(), r.url.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("Росатом", "/activity/3"), ("Физтех", "/activity/4")]
        );
    }
}
