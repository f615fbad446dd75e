use crate::cmd::MenuOption;
use crate::models::{parse_hex_color, Tier, Tierlist, TierlistEntry, User, VideoGame};
use crossterm::style::{Color, Stylize};
use itertools::Itertools;

/// Render `text` bold in a `#rrggbb` colour. Unparseable colours and `color == false` leave the text plain.
pub fn paint(text: &str, hex: &str, color: bool) -> String {
    match (color, parse_hex_color(hex)) {
        (true, Some((r, g, b))) => text.with(Color::Rgb { r, g, b }).bold().to_string(),
        _ => text.to_string(),
    }
}

/// Format a number with comma thousands separators
pub fn with_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",");
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `n` followed by `noun`, with an `s` unless there is exactly one
pub fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// List menu options, one per line
pub fn menu(sections: &[&[MenuOption]]) -> String {
    let options = sections
        .iter()
        .flat_map(|s| s.iter())
        .map(|(c, desc)| format!("  ({}) - {}", c, desc))
        .join("\n");
    format!("What would you like to do?\n{}\n", options)
}

pub fn games_table(games: &[VideoGame]) -> String {
    if games.is_empty() {
        return "No games found.".to_string();
    }
    games
        .iter()
        .map(|g| {
            format!(
                "  [{}] {} ({}, {}) by {} / {}, {} sold",
                g.game_id,
                g.name,
                g.platform,
                g.release_date,
                g.developer,
                g.publisher,
                with_thousands(g.sales)
            )
        })
        .join("\n")
}

pub fn tiers_table(tiers: &[Tier], color: bool) -> String {
    if tiers.is_empty() {
        return "No tiers found.".to_string();
    }
    tiers
        .iter()
        .map(|t| {
            format!(
                "  {}. {} {}",
                t.tier_rank,
                paint(&t.name, &t.color, color),
                t.color
            )
        })
        .join("\n")
}

pub fn users_table(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }
    users
        .iter()
        .map(|u| {
            format!(
                "  {} ({}){}",
                u.username,
                u.full_name,
                if u.is_admin { " [admin]" } else { "" }
            )
        })
        .join("\n")
}

pub fn tierlists_table(owner: &str, lists: &[Tierlist]) -> String {
    if lists.is_empty() {
        return format!("{} has no tierlists.", owner);
    }
    let rows = lists
        .iter()
        .map(|l| format!("  '{}' (created {})", l.tierlist_name, l.created))
        .join("\n");
    format!("Tierlists by {}:\n{}", owner, rows)
}

/// Render a tierlist with one row per tier, best tier first. Empty tiers show `-`.
pub fn tierlist_view(
    owner: &str,
    name: &str,
    tiers: &[Tier],
    entries: &[TierlistEntry],
    color: bool,
) -> String {
    let width = tiers
        .iter()
        .map(|t| t.name.chars().count())
        .max()
        .unwrap_or(0);
    let rows = tiers
        .iter()
        .map(|t| {
            let games = entries
                .iter()
                .filter(|e| e.tier.tier_id == t.tier_id)
                .map(|e| e.game.name.as_str())
                .join(", ");
            let label = format!("{:<width$}", t.name, width = width);
            format!(
                "  {} | {}",
                paint(&label, &t.color, color),
                if games.is_empty() { "-" } else { games.as_str() }
            )
        })
        .join("\n");
    format!("'{}' by {}\n{}", name, owner, rows)
}
