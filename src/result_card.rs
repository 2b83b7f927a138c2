use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use qrcode::render::svg;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};

use crate::leaderboard::rank_standings;
use crate::model::{ChapterRecord, User};

/// Prefix shared by the chapter names, dropped on the card.
pub const CHAPTER_PREFIX: &str = "Biology ";
pub const DEFAULT_AVATAR: &str = "/images/default-avatar.svg";

const WHATSAPP_SHARE: &str = "https://api.whatsapp.com/send";
const FACEBOOK_SHARE: &str = "https://www.facebook.com/sharer/sharer.php";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCard {
    pub display_name: String,
    pub photo_url: String,
    pub chapter_label: String,
    pub score: u32,
    pub rank: u32,
    pub share_text: String,
    pub whatsapp_url: String,
    pub facebook_url: String,
    /// SVG markup of a QR code pointing at the chapter page.
    pub qr_svg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCardState {
    Card(ResultCard),
    /// The user has no positive score in this chapter yet.
    NoResultYet,
}

/// Chapter name as shown on the card.
pub fn chapter_label(display_name: &str) -> String {
    display_name.replacen(CHAPTER_PREFIX, "", 1)
}

pub fn share_text(chapter_label: &str, score: u32, rank: u32) -> String {
    format!(
        "আমি '{}' অধ্যায়ে {} স্কোর করেছি! Study With Keshab-এ আমার র\u{200d}্যাঙ্ক #{}। তুমিও তোমার প্রস্তুতি যাচাই করো!",
        chapter_label, score, rank
    )
}

pub fn whatsapp_url(share_text: &str, page_url: &str) -> String {
    format!(
        "{}?text={}",
        WHATSAPP_SHARE,
        encode_component(&format!("{} {}", share_text, page_url))
    )
}

pub fn facebook_url(share_text: &str, page_url: &str) -> String {
    format!(
        "{}?u={}&quote={}",
        FACEBOOK_SHARE,
        encode_component(page_url),
        encode_component(share_text)
    )
}

fn qr_svg(page_url: &str) -> Option<String> {
    let code = QrCode::new(page_url.as_bytes()).ok()?;
    Some(
        code.render::<svg::Color>()
            .min_dimensions(120, 120)
            .build(),
    )
}

/// Finds `current_user` among the ranked rows and composes their card.
///
/// `rows` is the whole chapter, not the capped leaderboard query, so the rank here can go past
/// the last row of the leaderboard table.
pub fn build_result_card<I>(
    rows: I,
    current_user: &User,
    chapter_display_name: &str,
    page_url: &str,
) -> ResultCardState
where
    I: IntoIterator<Item = (User, Option<ChapterRecord>)>,
{
    let Some(standing) = rank_standings(rows)
        .into_iter()
        .find(|s| s.user.id == current_user.id)
    else {
        return ResultCardState::NoResultYet;
    };

    let label = chapter_label(chapter_display_name);
    let score = standing.record.total_score;
    let text = share_text(&label, score, standing.rank);

    ResultCardState::Card(ResultCard {
        display_name: current_user.name_or_unknown(),
        photo_url: current_user
            .photo_url
            .clone()
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        chapter_label: label,
        score,
        rank: standing.rank,
        whatsapp_url: whatsapp_url(&text, page_url),
        facebook_url: facebook_url(&text, page_url),
        share_text: text,
        qr_svg: qr_svg(page_url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://example.org/chapter?name=Biology%20Genetics";

    fn scored(id: &str, score: u32) -> (User, Option<ChapterRecord>) {
        (
            User {
                id: id.to_string(),
                display_name: Some(id.to_string()),
                ..Default::default()
            },
            Some(ChapterRecord {
                total_score: score,
                ..Default::default()
            }),
        )
    }

    fn rows() -> Vec<(User, Option<ChapterRecord>)> {
        vec![
            scored("A", 50),
            scored("B", 80),
            scored("C", 0),
            scored("D", 80),
        ]
    }

    fn current(id: &str) -> User {
        User {
            id: id.to_string(),
            display_name: Some(format!("Me {}", id)),
            ..Default::default()
        }
    }

    #[test]
    fn test_rank_for_tied_user() {
        let ResultCardState::Card(card) =
            build_result_card(rows(), &current("D"), "Biology Genetics", PAGE)
        else {
            panic!("expected a card");
        };
        assert_eq!(card.rank, 2);
        assert_eq!(card.score, 80);
        assert_eq!(card.display_name, "Me D");
        assert_eq!(card.chapter_label, "Genetics");
        assert_eq!(card.photo_url, DEFAULT_AVATAR);
        assert!(card.share_text.contains("#2"));
        assert!(card.qr_svg.as_deref().is_some_and(|s| s.contains("<svg")));
    }

    #[test]
    fn test_zero_score_has_no_card() {
        assert_eq!(
            build_result_card(rows(), &current("C"), "Biology Genetics", PAGE),
            ResultCardState::NoResultYet
        );
        assert_eq!(
            build_result_card(rows(), &current("Z"), "Biology Genetics", PAGE),
            ResultCardState::NoResultYet
        );
    }

    #[test]
    fn test_rank_beyond_leaderboard_cap() {
        let mut all: Vec<_> = (0..15).map(|i| scored(&format!("u{}", i), 100 - i)).collect();
        all.push(scored("late", 1));
        let ResultCardState::Card(card) = build_result_card(all, &current("late"), "Genetics", PAGE)
        else {
            panic!("expected a card");
        };
        assert_eq!(card.rank, 16);
    }

    #[test]
    fn test_encode_component_matches_uri_component_rules() {
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode_component("#/?:"), "%23%2F%3F%3A");
        assert_eq!(encode_component("আ"), "%E0%A6%86");
    }

    #[test]
    fn test_share_urls() {
        let text = share_text("Genetics", 80, 2);
        let whatsapp = whatsapp_url(&text, PAGE);
        assert!(whatsapp.starts_with("https://api.whatsapp.com/send?text="));
        assert!(whatsapp.ends_with(&encode_component(&format!(" {}", PAGE))));

        let facebook = facebook_url(&text, PAGE);
        assert_eq!(
            facebook,
            format!(
                "https://www.facebook.com/sharer/sharer.php?u={}&quote={}",
                encode_component(PAGE),
                encode_component(&text)
            )
        );
        assert!(!facebook.contains(' '));
    }

    #[test]
    fn test_chapter_label_strips_prefix_once() {
        assert_eq!(chapter_label("Biology Genetics"), "Genetics");
        assert_eq!(chapter_label("Physics Optics"), "Physics Optics");
        assert_eq!(
            chapter_label("Biology Biology Basics"),
            "Biology Basics"
        );
    }
}
