#![allow(dead_code)]

use dotenv::dotenv;
use std::cell::{Cell, RefCell};
use std::env;
use std::io::Cursor;

use chrono::NaiveDate;
use diesel::{Connection, PgConnection, RunQueryDsl};
use diesel_migrations::embed_migrations;
use itertools::Itertools;
use tierlist::config::Config;
use tierlist::console::Console;
use tierlist::db::{init_db_pool, today, DBWrapper, TierlistStore};
use tierlist::error::Error;
use tierlist::models::{
    hash_password, validate_full_name, validate_password, validate_tierlist_name,
    validate_username, GameId, GameTier, NewTier, NewVideoGame, Tier, TierId, Tierlist,
    TierlistEntry, User, VideoGame,
};
use tierlist::ui::App;

embed_migrations!("migrations/");

// ---- in memory store ----

/// A TierlistStore kept in memory, following the same rules as the database
#[derive(Default)]
pub struct MemoryStore {
    users: RefCell<Vec<User>>,
    games: RefCell<Vec<VideoGame>>,
    tiers: RefCell<Vec<Tier>>,
    tierlists: RefCell<Vec<Tierlist>>,
    entries: RefCell<Vec<GameTier>>,
    // make every operation fail as if the database went away
    broken: Cell<bool>,
}

impl MemoryStore {
    /// A store with the default tiers (S through F) and three games:
    /// 1: Chrono Trigger, 2: Doom, 3: Tetris
    pub fn seeded() -> MemoryStore {
        let store = MemoryStore::default();
        for (rank, (name, color)) in [
            ("S", "#ff7f7f"),
            ("A", "#ffbf7f"),
            ("B", "#ffdf7f"),
            ("C", "#ffff7f"),
            ("D", "#bfff7f"),
            ("F", "#7fbfff"),
        ]
        .iter()
        .enumerate()
        {
            store
                .add_tier(&NewTier {
                    tier_rank: rank as i32,
                    name: *name,
                    color: *color,
                })
                .expect("couldn't seed tier");
        }
        for (name, year, sales) in [
            ("Chrono Trigger", 1995, 2_360_000),
            ("Doom", 1993, 3_500_000),
            ("Tetris", 1989, 35_000_000),
        ]
        .iter()
        {
            store
                .add_game(&NewVideoGame {
                    name: *name,
                    developer: "Dev",
                    publisher: "Pub",
                    release_date: NaiveDate::from_ymd_opt(*year, 1, 1).unwrap(),
                    sales: *sales,
                    platform: "Various",
                })
                .expect("couldn't seed game");
        }
        store
    }

    pub fn with_user(self, username: &str, password: &str, is_admin: bool) -> MemoryStore {
        self.register_user(username, username, password)
            .expect("couldn't add user");
        if is_admin {
            self.set_admin(username, true).expect("couldn't set admin");
        }
        self
    }

    pub fn with_tierlist(self, username: &str, name: &str) -> MemoryStore {
        self.create_tierlist(username, name)
            .expect("couldn't add tierlist");
        self
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.set(broken);
    }

    fn check(&self) -> Result<(), Error> {
        if self.broken.get() {
            Err(Error::DBError(diesel::result::Error::NotFound))
        } else {
            Ok(())
        }
    }

    fn find_tierlist(&self, username: &str, name: &str) -> Result<Tierlist, Error> {
        self.tierlists
            .borrow()
            .iter()
            .find(|l| l.username == username && l.tierlist_name == name)
            .cloned()
            .ok_or(Error::NoSuchTierlist)
    }

    fn find_tier(&self, tier_id: TierId) -> Result<Tier, Error> {
        self.tiers
            .borrow()
            .iter()
            .find(|t| t.tier_id == tier_id)
            .cloned()
            .ok_or(Error::NoSuchTier)
    }

    fn entry_position(&self, username: &str, name: &str, game_id: GameId) -> Option<usize> {
        self.entries.borrow().iter().position(|e| {
            e.username == username && e.tierlist_name == name && e.game_id == game_id
        })
    }
}

impl TierlistStore for MemoryStore {
    fn register_user(
        &self,
        username: &str,
        full_name: &str,
        password: &str,
    ) -> Result<User, Error> {
        self.check()?;
        validate_username(username)?;
        validate_full_name(full_name)?;
        validate_password(password)?;
        if self.find_user(username).is_ok() {
            return Err(Error::UsernameTaken);
        }
        let user = User {
            username: username.to_string(),
            full_name: full_name.trim().to_string(),
            password_hash: hash_password(password, 4)?,
            is_admin: false,
        };
        self.users.borrow_mut().push(user.clone());
        Ok(user)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<User, Error> {
        let user = self.find_user(username)?;
        if user.check_password(password) {
            Ok(user)
        } else {
            Err(Error::IncorrectCredentials)
        }
    }

    fn find_user(&self, username: &str) -> Result<User, Error> {
        self.check()?;
        self.users
            .borrow()
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(Error::NoSuchUser)
    }

    fn list_users(&self) -> Result<Vec<User>, Error> {
        self.check()?;
        Ok(self
            .users
            .borrow()
            .iter()
            .cloned()
            .sorted_by(|a, b| a.username.cmp(&b.username))
            .collect())
    }

    fn change_password(&self, username: &str, password: &str) -> Result<(), Error> {
        self.check()?;
        validate_password(password)?;
        let hash = hash_password(password, 4)?;
        let mut users = self.users.borrow_mut();
        let user = users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or(Error::NoSuchUser)?;
        user.password_hash = hash;
        Ok(())
    }

    fn set_admin(&self, username: &str, is_admin: bool) -> Result<(), Error> {
        self.check()?;
        let mut users = self.users.borrow_mut();
        let user = users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or(Error::NoSuchUser)?;
        user.is_admin = is_admin;
        Ok(())
    }

    fn list_games(&self) -> Result<Vec<VideoGame>, Error> {
        self.check()?;
        Ok(self
            .games
            .borrow()
            .iter()
            .cloned()
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect())
    }

    fn search_games(&self, pattern: &str) -> Result<Vec<VideoGame>, Error> {
        let pattern = pattern.to_lowercase();
        Ok(self
            .list_games()?
            .into_iter()
            .filter(|g| g.name.to_lowercase().contains(&pattern))
            .collect())
    }

    fn top_selling_games(&self, limit: i64) -> Result<Vec<VideoGame>, Error> {
        Ok(self
            .list_games()?
            .into_iter()
            .sorted_by(|a, b| b.sales.cmp(&a.sales).then_with(|| a.name.cmp(&b.name)))
            .take(limit as usize)
            .collect())
    }

    fn add_game(&self, game: &NewVideoGame) -> Result<VideoGame, Error> {
        self.check()?;
        game.validate(today())?;
        let mut games = self.games.borrow_mut();
        let added = VideoGame {
            game_id: games.len() as GameId + 1,
            name: game.name.to_string(),
            developer: game.developer.to_string(),
            publisher: game.publisher.to_string(),
            release_date: game.release_date,
            sales: game.sales,
            platform: game.platform.to_string(),
        };
        games.push(added.clone());
        Ok(added)
    }

    fn list_tiers(&self) -> Result<Vec<Tier>, Error> {
        self.check()?;
        Ok(self
            .tiers
            .borrow()
            .iter()
            .cloned()
            .sorted_by_key(|t| t.tier_rank)
            .collect())
    }

    fn add_tier(&self, tier: &NewTier) -> Result<Tier, Error> {
        self.check()?;
        tier.validate()?;
        let mut tiers = self.tiers.borrow_mut();
        if tiers.iter().any(|t| t.tier_rank == tier.tier_rank) {
            return Err(Error::TierRankTaken);
        }
        let name = tier.name.to_lowercase();
        if tiers.iter().any(|t| t.name.to_lowercase() == name) {
            return Err(Error::TierNameTaken);
        }
        let added = Tier {
            tier_id: tiers.len() as TierId + 1,
            tier_rank: tier.tier_rank,
            name: tier.name.to_string(),
            color: tier.color.to_string(),
        };
        tiers.push(added.clone());
        Ok(added)
    }

    fn list_tierlists(&self, username: &str) -> Result<Vec<Tierlist>, Error> {
        self.find_user(username)?;
        Ok(self
            .tierlists
            .borrow()
            .iter()
            .filter(|l| l.username == username)
            .cloned()
            .sorted_by(|a, b| a.tierlist_name.cmp(&b.tierlist_name))
            .collect())
    }

    fn create_tierlist(&self, username: &str, name: &str) -> Result<Tierlist, Error> {
        validate_tierlist_name(name)?;
        self.find_user(username)?;
        if self.find_tierlist(username, name).is_ok() {
            return Err(Error::TierlistExists);
        }
        let list = Tierlist {
            username: username.to_string(),
            tierlist_name: name.to_string(),
            created: today(),
        };
        self.tierlists.borrow_mut().push(list.clone());
        Ok(list)
    }

    fn delete_tierlist(&self, username: &str, name: &str) -> Result<(), Error> {
        self.check()?;
        self.find_tierlist(username, name)?;
        self.entries
            .borrow_mut()
            .retain(|e| !(e.username == username && e.tierlist_name == name));
        self.tierlists
            .borrow_mut()
            .retain(|l| !(l.username == username && l.tierlist_name == name));
        Ok(())
    }

    fn tierlist_entries(&self, username: &str, name: &str) -> Result<Vec<TierlistEntry>, Error> {
        self.check()?;
        self.find_tierlist(username, name)?;
        let games = self.games.borrow();
        let mut entries = Vec::new();
        for e in self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.username == username && e.tierlist_name == name)
        {
            let game = games
                .iter()
                .find(|g| g.game_id == e.game_id)
                .cloned()
                .ok_or(Error::NoSuchGame)?;
            entries.push(TierlistEntry {
                tier: self.find_tier(e.tier_id)?,
                game,
            });
        }
        Ok(entries
            .into_iter()
            .sorted_by(|a, b| {
                a.tier
                    .tier_rank
                    .cmp(&b.tier.tier_rank)
                    .then_with(|| a.game.name.cmp(&b.game.name))
            })
            .collect())
    }

    fn assign_game(
        &self,
        username: &str,
        name: &str,
        game_id: GameId,
        tier_id: TierId,
    ) -> Result<(), Error> {
        self.check()?;
        self.find_tierlist(username, name)?;
        if !self.games.borrow().iter().any(|g| g.game_id == game_id) {
            return Err(Error::NoSuchGame);
        }
        self.find_tier(tier_id)?;
        if self.entry_position(username, name, game_id).is_some() {
            return Err(Error::GameAlreadyInTierlist);
        }
        self.entries.borrow_mut().push(GameTier {
            game_id,
            username: username.to_string(),
            tierlist_name: name.to_string(),
            tier_id,
        });
        Ok(())
    }

    fn move_game(
        &self,
        username: &str,
        name: &str,
        game_id: GameId,
        tier_id: TierId,
    ) -> Result<(), Error> {
        self.check()?;
        self.find_tierlist(username, name)?;
        self.find_tier(tier_id)?;
        let pos = self
            .entry_position(username, name, game_id)
            .ok_or(Error::GameNotInTierlist)?;
        self.entries.borrow_mut()[pos].tier_id = tier_id;
        Ok(())
    }

    fn remove_game(&self, username: &str, name: &str, game_id: GameId) -> Result<(), Error> {
        self.check()?;
        self.find_tierlist(username, name)?;
        let pos = self
            .entry_position(username, name, game_id)
            .ok_or(Error::GameNotInTierlist)?;
        self.entries.borrow_mut().remove(pos);
        Ok(())
    }
}

// ---- scripted sessions ----

/// Run the menus against `store`, feeding them `script` one line at a time.
/// Leading and trailing whitespace is stripped from each script line.
/// Returns everything printed, and the store afterwards.
pub fn session_with(store: MemoryStore, config: Config, script: &str) -> (String, MemoryStore) {
    let input = script.trim().lines().map(str::trim).join("\n") + "\n";
    let console = Console::new(Cursor::new(input), Vec::new(), false);
    let mut app = App::new(store, console, config);
    app.run().expect("session ended with an error");
    let (store, console) = app.into_parts();
    let output = String::from_utf8(console.into_output()).expect("output isn't utf-8");
    (output, store)
}

pub fn session(store: MemoryStore, script: &str) -> (String, MemoryStore) {
    let config = Config {
        color: false,
        ..Config::default()
    };
    session_with(store, config, script)
}

// ---- postgres ----

// postgres database test helper
// the helper creates a new database for tests and drops it once done
pub struct PgTestContext {
    base_url: String,
    default_url: String,
    db_name: String,
}

impl PgTestContext {
    /// Create a test database named after `test_name`. None if the test database urls aren't configured.
    pub fn from_env(test_name: &str) -> Option<Self> {
        dotenv().ok();
        let base_url = env::var("DATABASE_TEST_BASE_URL").ok()?;
        let default_url = env::var("DATABASE_TEST_DEFAULT_URL").ok()?;
        let db_name = format!("tierlist_test_{}_{}", test_name, std::process::id());

        // connect to default db and create test db
        let conn =
            PgConnection::establish(&default_url).expect("cannot connect to default pg database");
        diesel::sql_query(format!("CREATE DATABASE {}", db_name))
            .execute(&conn)
            .expect("couldn't create test database");

        let ctx = PgTestContext {
            base_url,
            default_url,
            db_name,
        };
        // connect to test db and run migrations
        let conn_test =
            PgConnection::establish(&ctx.url()).expect("cannot connect to test database");
        embedded_migrations::run(&conn_test).expect("running migrations failed");
        Some(ctx)
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.db_name)
    }
}

impl Drop for PgTestContext {
    fn drop(&mut self) {
        let conn = match PgConnection::establish(&self.default_url) {
            Ok(conn) => conn,
            Err(e) => {
                eprintln!("cannot connect to default pg database: {}", e);
                return;
            }
        };
        let _ = diesel::sql_query(format!(
            "SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = '{}';",
            self.db_name
        ))
        .execute(&conn);
        if let Err(e) =
            diesel::sql_query(format!("DROP DATABASE {}", self.db_name)).execute(&conn)
        {
            eprintln!("cannot drop test database {}: {}", self.db_name, e);
        }
    }
}

/// Run `test` against a fresh migrated database. Skipped when no test database is configured.
pub fn with_test_db<F: FnOnce(&DBWrapper)>(test_name: &str, test: F) {
    let ctx = match PgTestContext::from_env(test_name) {
        Some(ctx) => ctx,
        None => {
            eprintln!(
                "skipping {}: DATABASE_TEST_BASE_URL and DATABASE_TEST_DEFAULT_URL must be set",
                test_name
            );
            return;
        }
    };
    let pool = init_db_pool(&ctx.url()).expect("couldn't create pool");
    let db = DBWrapper::from_pg_pool(&pool).expect("couldn't get connection");
    test(&db);
}
