//! Pure mapping of raw catalog records into the stable internal model.
//!
//! Records are read as untyped JSON because their shape depends on which fields
//! the query expanded: `genres` is `[12, 31]` for a listing and
//! `[{"id":12,"name":"Role-playing (RPG)"}]` for a detail lookup. Every function
//! here is total; anything unexpected maps to an empty or default value.

use serde_json::Value;
use std::cmp::Ordering;

use super::model::{Franchise, Game, NamedRef, Platform, Screenshot, Studio, Video, PLACEHOLDER_IMAGE};

const THUMB_TOKEN: &str = "t_thumb";
pub const COVER_SIZE: &str = "t_cover_big_2x";
pub const SCREENSHOT_SIZE: &str = "t_screenshot_huge";
pub const LOGO_SIZE: &str = "t_logo_med";

/// Swap the thumbnail size token for `size` and make the URL absolute.
pub fn image_url(raw: Option<&str>, size: &str) -> String {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => normalize_url(&url.replace(THUMB_TOKEN, size)),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

fn normalize_url(raw: &str) -> String {
    if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    }
}

fn value_as_i64(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    match v.as_f64() {
        Some(f) if f.fract() == 0.0 && f.is_finite() => Some(f as i64),
        _ => None,
    }
}

fn value_as_f64(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str().and_then(|s| s.trim().parse::<f64>().ok())
}

fn field_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn field_id(raw: &Value) -> i64 {
    raw.get("id").and_then(value_as_i64).unwrap_or_default()
}

fn nested_url<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)?.get("url")?.as_str()
}

fn array<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// A reference is either a bare id or an expanded object with an id.
fn to_ref(v: &Value) -> Option<NamedRef> {
    if let Some(id) = value_as_i64(v) {
        return Some(NamedRef { id, name: None });
    }
    let id = v.get("id").and_then(value_as_i64)?;
    Some(NamedRef {
        id,
        name: field_str(v, "name"),
    })
}

fn refs(raw: &Value, key: &str) -> Vec<NamedRef> {
    array(raw, key).iter().filter_map(to_ref).collect()
}

fn companies(raw: &Value, role: &str) -> Vec<NamedRef> {
    array(raw, "involved_companies")
        .iter()
        .filter(|involved| involved.get(role).and_then(Value::as_bool) == Some(true))
        .filter_map(|involved| involved.get("company").and_then(to_ref))
        .collect()
}

fn screenshot(v: &Value) -> Option<Screenshot> {
    if let Some(id) = value_as_i64(v) {
        return Some(Screenshot {
            id,
            url: PLACEHOLDER_IMAGE.to_string(),
        });
    }
    v.as_object()?;
    Some(Screenshot {
        id: field_id(v),
        url: image_url(v.get("url").and_then(Value::as_str), SCREENSHOT_SIZE),
    })
}

fn video(v: &Value) -> Option<Video> {
    if let Some(id) = value_as_i64(v) {
        return Some(Video {
            id,
            video_id: None,
            name: None,
        });
    }
    v.as_object()?;
    Some(Video {
        id: field_id(v),
        video_id: field_str(v, "video_id"),
        name: field_str(v, "name"),
    })
}

pub fn map_game(raw: &Value) -> Game {
    Game {
        id: field_id(raw),
        name: field_str(raw, "name").unwrap_or_default(),
        description: field_str(raw, "summary"),
        cover_url: image_url(nested_url(raw, "cover"), COVER_SIZE),
        platforms: refs(raw, "platforms"),
        rating: raw
            .get("total_rating")
            .and_then(value_as_f64)
            .unwrap_or(0.0),
        screenshots: array(raw, "screenshots")
            .iter()
            .filter_map(screenshot)
            .collect(),
        release_date: raw.get("first_release_date").and_then(value_as_i64),
        genres: refs(raw, "genres"),
        themes: refs(raw, "themes"),
        franchises: refs(raw, "franchises"),
        game_modes: refs(raw, "game_modes"),
        videos: array(raw, "videos").iter().filter_map(video).collect(),
        developers: companies(raw, "developer"),
        publishers: companies(raw, "publisher"),
    }
}

/// Newest release first; undated games keep their relative order after all dated ones.
pub fn sort_by_release_desc(games: &mut [Game]) {
    games.sort_by(|a, b| match (a.release_date, b.release_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Cover of the first game, which after sorting is the newest release.
pub fn franchise_cover(games: &[Game]) -> String {
    games
        .first()
        .map(|g| g.cover_url.clone())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

pub fn map_franchise(raw: &Value) -> Franchise {
    let mut games: Vec<Game> = array(raw, "games")
        .iter()
        .filter(|g| g.is_object())
        .map(map_game)
        .collect();
    sort_by_release_desc(&mut games);
    Franchise {
        id: field_id(raw),
        name: field_str(raw, "name").unwrap_or_default(),
        cover_url: franchise_cover(&games),
        games,
    }
}

pub fn map_studio(raw: &Value) -> Studio {
    Studio {
        id: field_id(raw),
        name: field_str(raw, "name").unwrap_or_default(),
        logo_url: image_url(nested_url(raw, "logo"), LOGO_SIZE),
        developed: refs(raw, "developed").into_iter().map(|r| r.id).collect(),
    }
}

/// Raw platform as returned by the catalog; the display name is canonicalized by the client.
pub fn map_platform(raw: &Value) -> Platform {
    Platform {
        id: field_id(raw),
        name: field_str(raw, "name").unwrap_or_default(),
    }
}

/// `{ "count": n }` from a count endpoint; anything else counts as zero.
pub fn parse_count(raw: &Value) -> u64 {
    raw.get("count").and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rewrites_thumbnail_urls() {
        assert_eq!(
            image_url(
                Some("//images.igdb.com/igdb/image/upload/t_thumb/co1wyy.jpg"),
                COVER_SIZE
            ),
            "https://images.igdb.com/igdb/image/upload/t_cover_big_2x/co1wyy.jpg"
        );
        assert_eq!(image_url(None, COVER_SIZE), PLACEHOLDER_IMAGE);
        assert_eq!(image_url(Some("  "), LOGO_SIZE), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn sparse_game_has_empty_collections() {
        let game = map_game(&json!({ "id": 7, "name": "Sparse" }));
        assert_eq!(game.id, 7);
        assert_eq!(game.rating, 0.0);
        assert_eq!(game.cover_url, PLACEHOLDER_IMAGE);
        assert!(game.platforms.is_empty());
        assert!(game.screenshots.is_empty());
        assert!(game.genres.is_empty());
        assert!(game.themes.is_empty());
        assert!(game.franchises.is_empty());
        assert!(game.game_modes.is_empty());
        assert!(game.videos.is_empty());
        assert!(game.developers.is_empty());
        assert!(game.publishers.is_empty());
        assert_eq!(game.release_date, None);
    }

    #[test]
    fn never_panics_on_odd_shapes() {
        for raw in [
            json!(null),
            json!(42),
            json!("game"),
            json!([]),
            json!({ "genres": "rpg", "screenshots": {}, "total_rating": "n/a" }),
            json!({ "involved_companies": [null, 3, { "developer": "yes" }] }),
            json!({ "platforms": [null, "pc", { "name": "no id" }] }),
        ] {
            let game = map_game(&raw);
            assert_eq!(game.rating, 0.0);
            assert!(game.developers.is_empty());
            assert!(game.platforms.is_empty());
            let _ = map_franchise(&raw);
            let _ = map_studio(&raw);
        }
    }

    #[test]
    fn maps_detail_record() {
        let raw = json!({
            "id": 1942,
            "name": "The Witcher 3: Wild Hunt",
            "summary": "Geralt hunts.",
            "cover": { "id": 1, "url": "//images.igdb.com/igdb/image/upload/t_thumb/co1wyy.jpg" },
            "platforms": [{ "id": 6, "name": "PC (Microsoft Windows)" }, 48],
            "total_rating": 93.4,
            "first_release_date": 1431993600,
            "genres": [{ "id": 12, "name": "Role-playing (RPG)" }],
            "screenshots": [{ "id": 9, "url": "//images.igdb.com/igdb/image/upload/t_thumb/sc1.jpg" }],
            "videos": [{ "id": 5, "video_id": "c0i88t0Kacs", "name": "Trailer" }],
            "involved_companies": [
                { "company": { "id": 908, "name": "CD Projekt RED" }, "developer": true, "publisher": false },
                { "company": { "id": 1234, "name": "Bandai Namco" }, "developer": false, "publisher": true },
                { "company": null, "developer": true, "publisher": true }
            ]
        });
        let game = map_game(&raw);
        assert_eq!(game.name, "The Witcher 3: Wild Hunt");
        assert_eq!(game.description.as_deref(), Some("Geralt hunts."));
        assert_eq!(game.rating, 93.4);
        assert_eq!(game.platforms.len(), 2);
        assert_eq!(game.platforms[1], NamedRef { id: 48, name: None });
        assert_eq!(
            game.screenshots[0].url,
            "https://images.igdb.com/igdb/image/upload/t_screenshot_huge/sc1.jpg"
        );
        assert_eq!(game.videos[0].video_id.as_deref(), Some("c0i88t0Kacs"));
        assert_eq!(game.developers.len(), 1);
        assert_eq!(game.developers[0].name.as_deref(), Some("CD Projekt RED"));
        assert_eq!(game.publishers.len(), 1);
        assert_eq!(game.publishers[0].id, 1234);
    }

    #[test]
    fn franchise_sorts_newest_first_with_undated_last() {
        let raw = json!({
            "id": 3,
            "name": "Saga",
            "games": [
                { "id": 1, "name": "Old", "first_release_date": 100, "cover": { "url": "//x/t_thumb/old.jpg" } },
                { "id": 2, "name": "Undated", "cover": { "url": "//x/t_thumb/undated.jpg" } },
                { "id": 3, "name": "New", "first_release_date": 300, "cover": { "url": "//x/t_thumb/new.jpg" } },
                { "id": 4, "name": "Mid", "first_release_date": 200 }
            ]
        });
        let franchise = map_franchise(&raw);
        let order: Vec<i64> = franchise.games.iter().map(|g| g.id).collect();
        assert_eq!(order, vec![3, 4, 1, 2]);
        assert_eq!(franchise.cover_url, "https://x/t_cover_big_2x/new.jpg");
    }

    #[test]
    fn franchise_cover_falls_back_to_placeholder() {
        let coverless = map_franchise(&json!({
            "id": 3,
            "games": [{ "id": 1, "first_release_date": 10 }, { "id": 2, "first_release_date": 5, "cover": { "url": "//x/t_thumb/a.jpg" } }]
        }));
        assert_eq!(coverless.cover_url, PLACEHOLDER_IMAGE);

        let empty = map_franchise(&json!({ "id": 4, "name": "Empty" }));
        assert!(empty.games.is_empty());
        assert_eq!(empty.cover_url, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn maps_studio_logo_and_developed_ids() {
        let studio = map_studio(&json!({
            "id": 908,
            "name": "CD Projekt RED",
            "logo": { "url": "//images.igdb.com/igdb/image/upload/t_thumb/cl1.png" },
            "developed": [{ "id": 1942 }, 1943]
        }));
        assert_eq!(
            studio.logo_url,
            "https://images.igdb.com/igdb/image/upload/t_logo_med/cl1.png"
        );
        assert_eq!(studio.developed, vec![1942, 1943]);
    }

    #[test]
    fn count_defaults_to_zero() {
        assert_eq!(parse_count(&json!({ "count": 12 })), 12);
        assert_eq!(parse_count(&json!({})), 0);
        assert_eq!(parse_count(&json!([])), 0);
    }
}
