use super::schema::{game_tier, tier, tierlist, user_info, video_game};
use crate::error::Error;
use bcrypt;
use chrono::NaiveDate;

pub type GameId = i32;
pub type TierId = i32;

pub const MAX_USERNAME_LEN: usize = 20;
pub const MAX_FULL_NAME_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 4;
pub const MAX_TIERLIST_NAME_LEN: usize = 50;
pub const MAX_TIER_NAME_LEN: usize = 20;
pub const MAX_GAME_FIELD_LEN: usize = 100;
pub const MAX_PLATFORM_LEN: usize = 50;

#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[derive(Insertable)]
#[table_name = "user_info"]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

impl User {
    pub fn check_password(&self, password: &str) -> bool {
        match bcrypt::verify(password.as_bytes(), &self.password_hash) {
            Ok(true) => true,
            _ => false,
        }
    }
}

/// Hash a password for storage. `cost` is the bcrypt work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, Error> {
    Ok(bcrypt::hash(password.as_bytes(), cost)?)
}

#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub tier_id: TierId,
    // lower ranks are better
    pub tier_rank: i32,
    pub name: String,
    pub color: String,
}

#[derive(Insertable, Debug)]
#[table_name = "tier"]
pub struct NewTier<'a> {
    pub tier_rank: i32,
    pub name: &'a str,
    pub color: &'a str,
}

impl NewTier<'_> {
    pub fn validate(&self) -> Result<(), Error> {
        if self.tier_rank < 0 {
            return Err(Error::InvalidTierRank);
        }
        check_text(self.name, "tier name", MAX_TIER_NAME_LEN)?;
        match parse_hex_color(self.color) {
            Some(_) => Ok(()),
            None => Err(Error::InvalidColor(self.color.to_string())),
        }
    }
}

#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct VideoGame {
    pub game_id: GameId,
    pub name: String,
    pub developer: String,
    pub publisher: String,
    pub release_date: NaiveDate,
    pub sales: i64,
    pub platform: String,
}

#[derive(Insertable, Debug)]
#[table_name = "video_game"]
pub struct NewVideoGame<'a> {
    pub name: &'a str,
    pub developer: &'a str,
    pub publisher: &'a str,
    pub release_date: NaiveDate,
    pub sales: i64,
    pub platform: &'a str,
}

impl NewVideoGame<'_> {
    /// Check text fields, that sales are non negative, and that the game wasn't released after `today`
    pub fn validate(&self, today: NaiveDate) -> Result<(), Error> {
        check_text(self.name, "game name", MAX_GAME_FIELD_LEN)?;
        check_text(self.developer, "developer", MAX_GAME_FIELD_LEN)?;
        check_text(self.publisher, "publisher", MAX_GAME_FIELD_LEN)?;
        check_text(self.platform, "platform", MAX_PLATFORM_LEN)?;
        if self.sales < 0 {
            return Err(Error::NegativeSales);
        }
        if self.release_date > today {
            return Err(Error::FutureReleaseDate);
        }
        Ok(())
    }
}

#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct Tierlist {
    pub username: String,
    pub tierlist_name: String,
    pub created: NaiveDate,
}

#[derive(Insertable)]
#[table_name = "tierlist"]
pub struct NewTierlist<'a> {
    pub username: &'a str,
    pub tierlist_name: &'a str,
    pub created: NaiveDate,
}

#[derive(Queryable, Debug, Clone, PartialEq, Eq)]
pub struct GameTier {
    pub game_id: GameId,
    pub username: String,
    pub tierlist_name: String,
    pub tier_id: TierId,
}

#[derive(Insertable)]
#[table_name = "game_tier"]
pub struct NewGameTier<'a> {
    pub game_id: GameId,
    pub username: &'a str,
    pub tierlist_name: &'a str,
    pub tier_id: TierId,
}

/// A game placed in a tier of some tierlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierlistEntry {
    pub tier: Tier,
    pub game: VideoGame,
}

fn check_text(value: &str, field: &'static str, max: usize) -> Result<(), Error> {
    if value.trim().is_empty() {
        Err(Error::MissingField(field))
    } else if value.chars().count() > max {
        Err(Error::FieldTooLong { field, max })
    } else {
        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), Error> {
    let len = username.chars().count();
    if len == 0
        || len > MAX_USERNAME_LEN
        || !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Err(Error::InvalidUsername)
    } else {
        Ok(())
    }
}

pub fn validate_full_name(full_name: &str) -> Result<(), Error> {
    check_text(full_name, "full name", MAX_FULL_NAME_LEN)
}

pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Err(Error::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        })
    } else {
        Ok(())
    }
}

pub fn validate_tierlist_name(name: &str) -> Result<(), Error> {
    check_text(name, "tierlist name", MAX_TIERLIST_NAME_LEN)
}

/// Parse a `#rrggbb` colour into its components
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
