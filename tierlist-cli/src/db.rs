use crate::diesel::prelude::*;
use crate::error::Error;
use crate::models::{
    hash_password, validate_full_name, validate_password, validate_tierlist_name,
    validate_username, GameId, GameTier, NewGameTier, NewTier, NewTierlist, NewUser, NewVideoGame,
    Tier, TierId, Tierlist, TierlistEntry, User, VideoGame,
};
use crate::schema::{game_tier, tier, tierlist, user_info, video_game};
use bcrypt;
use chrono::{Local, NaiveDate};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};
use diesel::result::DatabaseErrorKind;
use std::time::Duration;
use tracing::{debug, info};

sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

/// Everything the menus can ask of the tierlist database.
///
/// Tierlists are addressed by (owner, name). Operations that change a tierlist
/// take the owner's username, so callers pass the logged in user to restrict
/// changes to lists that user owns.
pub trait TierlistStore {
    // ---- Users ----

    /// Create a (non admin) user with the given credentials
    fn register_user(&self, username: &str, full_name: &str, password: &str)
        -> Result<User, Error>;
    /// Lookup a user by username and check their password
    fn authenticate(&self, username: &str, password: &str) -> Result<User, Error>;
    fn find_user(&self, username: &str) -> Result<User, Error>;
    /// All users, ordered by username
    fn list_users(&self) -> Result<Vec<User>, Error>;
    fn change_password(&self, username: &str, password: &str) -> Result<(), Error>;
    fn set_admin(&self, username: &str, is_admin: bool) -> Result<(), Error>;

    // ---- Games ----

    /// All games, ordered by name
    fn list_games(&self) -> Result<Vec<VideoGame>, Error>;
    /// Games with names containing `pattern` (case insensitive), ordered by name
    fn search_games(&self, pattern: &str) -> Result<Vec<VideoGame>, Error>;
    /// The `limit` best selling games, best first
    fn top_selling_games(&self, limit: i64) -> Result<Vec<VideoGame>, Error>;
    fn add_game(&self, game: &NewVideoGame) -> Result<VideoGame, Error>;

    // ---- Tiers ----

    /// All tiers, best (lowest rank) first
    fn list_tiers(&self) -> Result<Vec<Tier>, Error>;
    fn add_tier(&self, tier: &NewTier) -> Result<Tier, Error>;

    // ---- Tierlists ----

    /// A user's tierlists, ordered by name
    fn list_tierlists(&self, username: &str) -> Result<Vec<Tierlist>, Error>;
    fn create_tierlist(&self, username: &str, name: &str) -> Result<Tierlist, Error>;
    /// Delete a tierlist and every game placed in it
    fn delete_tierlist(&self, username: &str, name: &str) -> Result<(), Error>;
    /// The games placed in a tierlist, ordered by tier rank and then game name
    fn tierlist_entries(&self, username: &str, name: &str) -> Result<Vec<TierlistEntry>, Error>;
    /// Place a game that isn't yet in a tierlist into a tier
    fn assign_game(
        &self,
        username: &str,
        name: &str,
        game_id: GameId,
        tier_id: TierId,
    ) -> Result<(), Error>;
    /// Move a game already in a tierlist to a different tier
    fn move_game(
        &self,
        username: &str,
        name: &str,
        game_id: GameId,
        tier_id: TierId,
    ) -> Result<(), Error>;
    fn remove_game(&self, username: &str, name: &str, game_id: GameId) -> Result<(), Error>;
}

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// The client only ever needs one connection.
pub fn init_db_pool(db_url: &str) -> Result<PgPool, PoolError> {
    let manage = ConnectionManager::<PgConnection>::new(db_url);
    Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_secs(5))
        .build(manage)
}

/// The current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Escape LIKE wildcards so `pattern` matches literally
pub fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '%' || c == '_' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_unique_violation(e: &diesel::result::Error) -> bool {
    match e {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => true,
        _ => false,
    }
}

/// A database connection wrapper, which associates the database with functions to manipulate it
pub struct DBWrapper {
    db: PooledConnection<ConnectionManager<PgConnection>>,
}

impl DBWrapper {
    /// Take the connection out of the pool
    pub fn from_pg_pool(pool: &PgPool) -> Result<DBWrapper, Error> {
        Ok(DBWrapper { db: pool.get()? })
    }

    fn find_game(&self, game_id: GameId) -> Result<VideoGame, Error> {
        match video_game::table
            .find(game_id)
            .first::<VideoGame>(&self.db)
            .optional()?
        {
            Some(game) => Ok(game),
            None => Err(Error::NoSuchGame),
        }
    }

    fn find_tier(&self, tier_id: TierId) -> Result<Tier, Error> {
        match tier::table.find(tier_id).first::<Tier>(&self.db).optional()? {
            Some(tier) => Ok(tier),
            None => Err(Error::NoSuchTier),
        }
    }

    /// Lookup a tierlist owned by `username`
    fn find_tierlist(&self, username: &str, name: &str) -> Result<Tierlist, Error> {
        use tierlist::dsl;
        match dsl::tierlist
            .filter(dsl::username.eq(username).and(dsl::tierlist_name.eq(name)))
            .first::<Tierlist>(&self.db)
            .optional()?
        {
            Some(list) => Ok(list),
            None => Err(Error::NoSuchTierlist),
        }
    }

    fn find_game_tier(
        &self,
        username: &str,
        name: &str,
        game_id: GameId,
    ) -> Result<Option<GameTier>, Error> {
        use game_tier::dsl;
        Ok(dsl::game_tier
            .filter(
                dsl::username
                    .eq(username)
                    .and(dsl::tierlist_name.eq(name))
                    .and(dsl::game_id.eq(game_id)),
            )
            .first::<GameTier>(&self.db)
            .optional()?)
    }
}

impl TierlistStore for DBWrapper {
    fn register_user(
        &self,
        username: &str,
        full_name: &str,
        password: &str,
    ) -> Result<User, Error> {
        validate_username(username)?;
        validate_full_name(full_name)?;
        validate_password(password)?;
        // check for existing user
        match self.find_user(username) {
            Ok(_) => Err(Error::UsernameTaken),
            Err(Error::NoSuchUser) => {
                let hashed_pass = hash_password(password, bcrypt::DEFAULT_COST)?;
                let user = NewUser {
                    username,
                    full_name: full_name.trim(),
                    password_hash: &*hashed_pass,
                    is_admin: false,
                };
                let user = diesel::insert_into(user_info::table)
                    .values(&user)
                    .get_result::<User>(&self.db)
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            Error::UsernameTaken
                        } else {
                            Error::from(e)
                        }
                    })?;
                info!(username, "registered user");
                Ok(user)
            }
            Err(err) => Err(err),
        }
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<User, Error> {
        let user = self.find_user(username)?;
        match user.check_password(password) {
            true => {
                debug!(username, "authenticated");
                Ok(user)
            }
            false => Err(Error::IncorrectCredentials),
        }
    }

    fn find_user(&self, username: &str) -> Result<User, Error> {
        match user_info::table
            .find(username)
            .first::<User>(&self.db)
            .optional()?
        {
            Some(user) => Ok(user),
            None => Err(Error::NoSuchUser),
        }
    }

    fn list_users(&self) -> Result<Vec<User>, Error> {
        Ok(user_info::table
            .order(user_info::username.asc())
            .load::<User>(&self.db)?)
    }

    fn change_password(&self, username: &str, password: &str) -> Result<(), Error> {
        validate_password(password)?;
        let hashed_pass = hash_password(password, bcrypt::DEFAULT_COST)?;
        let updated = diesel::update(user_info::table.find(username))
            .set(user_info::password_hash.eq(hashed_pass))
            .execute(&self.db)?;
        if updated == 0 {
            return Err(Error::NoSuchUser);
        }
        info!(username, "changed password");
        Ok(())
    }

    fn set_admin(&self, username: &str, is_admin: bool) -> Result<(), Error> {
        let updated = diesel::update(user_info::table.find(username))
            .set(user_info::is_admin.eq(is_admin))
            .execute(&self.db)?;
        if updated == 0 {
            return Err(Error::NoSuchUser);
        }
        info!(username, is_admin, "changed admin status");
        Ok(())
    }

    fn list_games(&self) -> Result<Vec<VideoGame>, Error> {
        Ok(video_game::table
            .order(video_game::name.asc())
            .load::<VideoGame>(&self.db)?)
    }

    fn search_games(&self, pattern: &str) -> Result<Vec<VideoGame>, Error> {
        debug!(pattern, "searching games");
        Ok(video_game::table
            .filter(video_game::name.ilike(format!("%{}%", escape_like(pattern))))
            .order(video_game::name.asc())
            .load::<VideoGame>(&self.db)?)
    }

    fn top_selling_games(&self, limit: i64) -> Result<Vec<VideoGame>, Error> {
        Ok(video_game::table
            .order((video_game::sales.desc(), video_game::name.asc()))
            .limit(limit)
            .load::<VideoGame>(&self.db)?)
    }

    fn add_game(&self, game: &NewVideoGame) -> Result<VideoGame, Error> {
        game.validate(today())?;
        let game = diesel::insert_into(video_game::table)
            .values(game)
            .get_result::<VideoGame>(&self.db)?;
        info!(game_id = game.game_id, name = %game.name, "added game");
        Ok(game)
    }

    fn list_tiers(&self) -> Result<Vec<Tier>, Error> {
        Ok(tier::table
            .order(tier::tier_rank.asc())
            .load::<Tier>(&self.db)?)
    }

    fn add_tier(&self, new_tier: &NewTier) -> Result<Tier, Error> {
        new_tier.validate()?;
        let rank_taken = tier::table
            .filter(tier::tier_rank.eq(new_tier.tier_rank))
            .first::<Tier>(&self.db)
            .optional()?;
        if rank_taken.is_some() {
            return Err(Error::TierRankTaken);
        }
        let name_taken = tier::table
            .filter(lower(tier::name).eq(new_tier.name.to_lowercase()))
            .first::<Tier>(&self.db)
            .optional()?;
        if name_taken.is_some() {
            return Err(Error::TierNameTaken);
        }
        let added = diesel::insert_into(tier::table)
            .values(new_tier)
            .get_result::<Tier>(&self.db)?;
        info!(tier_id = added.tier_id, name = %added.name, "added tier");
        Ok(added)
    }

    fn list_tierlists(&self, username: &str) -> Result<Vec<Tierlist>, Error> {
        use tierlist::dsl;
        self.find_user(username)?;
        Ok(dsl::tierlist
            .filter(dsl::username.eq(username))
            .order(dsl::tierlist_name.asc())
            .load::<Tierlist>(&self.db)?)
    }

    fn create_tierlist(&self, username: &str, name: &str) -> Result<Tierlist, Error> {
        validate_tierlist_name(name)?;
        self.find_user(username)?;
        match self.find_tierlist(username, name) {
            Ok(_) => Err(Error::TierlistExists),
            Err(Error::NoSuchTierlist) => {
                let list = NewTierlist {
                    username,
                    tierlist_name: name,
                    created: today(),
                };
                let list = diesel::insert_into(tierlist::table)
                    .values(&list)
                    .get_result::<Tierlist>(&self.db)
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            Error::TierlistExists
                        } else {
                            Error::from(e)
                        }
                    })?;
                info!(username, name, "created tierlist");
                Ok(list)
            }
            Err(err) => Err(err),
        }
    }

    fn delete_tierlist(&self, username: &str, name: &str) -> Result<(), Error> {
        self.db.transaction::<_, Error, _>(|| {
            self.find_tierlist(username, name)?;
            diesel::delete(
                game_tier::table.filter(
                    game_tier::username
                        .eq(username)
                        .and(game_tier::tierlist_name.eq(name)),
                ),
            )
            .execute(&self.db)?;
            diesel::delete(
                tierlist::table.filter(
                    tierlist::username
                        .eq(username)
                        .and(tierlist::tierlist_name.eq(name)),
                ),
            )
            .execute(&self.db)?;
            Ok(())
        })?;
        info!(username, name, "deleted tierlist");
        Ok(())
    }

    fn tierlist_entries(&self, username: &str, name: &str) -> Result<Vec<TierlistEntry>, Error> {
        self.find_tierlist(username, name)?;
        let rows = game_tier::table
            .inner_join(tier::table)
            .inner_join(video_game::table)
            .filter(
                game_tier::username
                    .eq(username)
                    .and(game_tier::tierlist_name.eq(name)),
            )
            .select((tier::all_columns, video_game::all_columns))
            .order((tier::tier_rank.asc(), video_game::name.asc()))
            .load::<(Tier, VideoGame)>(&self.db)?;
        Ok(rows
            .into_iter()
            .map(|(tier, game)| TierlistEntry { tier, game })
            .collect())
    }

    fn assign_game(
        &self,
        username: &str,
        name: &str,
        game_id: GameId,
        tier_id: TierId,
    ) -> Result<(), Error> {
        self.db.transaction::<_, Error, _>(|| {
            self.find_tierlist(username, name)?;
            self.find_game(game_id)?;
            self.find_tier(tier_id)?;
            if self.find_game_tier(username, name, game_id)?.is_some() {
                return Err(Error::GameAlreadyInTierlist);
            }
            let entry = NewGameTier {
                game_id,
                username,
                tierlist_name: name,
                tier_id,
            };
            diesel::insert_into(game_tier::table)
                .values(&entry)
                .execute(&self.db)?;
            Ok(())
        })?;
        info!(username, name, game_id, tier_id, "assigned game");
        Ok(())
    }

    fn move_game(
        &self,
        username: &str,
        name: &str,
        game_id: GameId,
        tier_id: TierId,
    ) -> Result<(), Error> {
        use game_tier::dsl;
        self.find_tierlist(username, name)?;
        self.find_tier(tier_id)?;
        if self.find_game_tier(username, name, game_id)?.is_none() {
            return Err(Error::GameNotInTierlist);
        }
        diesel::update(
            dsl::game_tier.filter(
                dsl::username
                    .eq(username)
                    .and(dsl::tierlist_name.eq(name))
                    .and(dsl::game_id.eq(game_id)),
            ),
        )
        .set(dsl::tier_id.eq(tier_id))
        .execute(&self.db)?;
        info!(username, name, game_id, tier_id, "moved game");
        Ok(())
    }

    fn remove_game(&self, username: &str, name: &str, game_id: GameId) -> Result<(), Error> {
        use game_tier::dsl;
        self.find_tierlist(username, name)?;
        let removed = diesel::delete(
            dsl::game_tier.filter(
                dsl::username
                    .eq(username)
                    .and(dsl::tierlist_name.eq(name))
                    .and(dsl::game_id.eq(game_id)),
            ),
        )
        .execute(&self.db)?;
        if removed == 0 {
            return Err(Error::GameNotInTierlist);
        }
        info!(username, name, game_id, "removed game");
        Ok(())
    }
}
