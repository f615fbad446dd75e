//! The interactive menus.
//!
//! Three nested loops: the startup menu (log in / create an account), the user
//! menu (with extra options for admins), and the menu for editing one of the
//! user's tierlists. Each loop reads a line, dispatches on its first letter,
//! and reports any error from the chosen operation before prompting again.
//! Only end of input and terminal errors escape a loop.

use crate::cmd::{
    is_yes, EditCommand, MenuOption, StartCommand, UserCommand, ADMIN_OPTIONS, CLIENT_OPTIONS,
    EDIT_OPTIONS, START_OPTIONS,
};
use crate::config::Config;
use crate::console::Console;
use crate::db::TierlistStore;
use crate::display;
use crate::error::Error;
use crate::models::{validate_username, GameId, NewTier, NewVideoGame, Tier, User};
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

pub const GENERIC_ERROR: &str = "An error occurred, please contact the administrator.";
pub const TOP_SELLERS_LIMIT: i64 = 10;

pub struct App<S, R, W> {
    store: S,
    console: Console<R, W>,
    config: Config,
}

impl<S: TierlistStore, R: BufRead, W: Write> App<S, R, W> {
    pub fn new(store: S, console: Console<R, W>, config: Config) -> Self {
        App {
            store,
            console,
            config,
        }
    }

    pub fn into_parts(self) -> (S, Console<R, W>) {
        (self.store, self.console)
    }

    /// Run the startup menu until the user quits or input runs out
    pub fn run(&mut self) -> Result<(), Error> {
        self.console.print("Welcome to the tier list maker!")?;
        match self.start_menu() {
            Ok(()) | Err(Error::InputClosed) => {}
            Err(e) => return Err(e),
        }
        self.console.print("Good bye!")
    }

    // ---- Error reporting ----

    /// Print an error from an operation. Internal errors are only detailed in debug mode.
    fn report(&mut self, e: &Error) -> Result<(), Error> {
        if e.is_user_facing() {
            debug!(error = %e, "operation rejected");
        } else {
            warn!(error = %e, "operation failed");
        }
        match e {
            Error::UnknownOption => self.console.print("Unknown option."),
            e if e.is_user_facing() || self.config.debug => {
                self.console.print(&format!("Error: {}", e))
            }
            _ => self.console.print(GENERIC_ERROR),
        }
    }

    /// Report a failed operation and carry on, unless the failure ends the session
    fn settle<T>(&mut self, res: Result<T, Error>) -> Result<Option<T>, Error> {
        match res {
            Ok(val) => Ok(Some(val)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.report(&e)?;
                Ok(None)
            }
        }
    }

    fn show_menu(&mut self, sections: &[&[MenuOption]]) -> Result<(), Error> {
        self.console.print(&display::menu(sections))
    }

    fn show_user_options(&mut self, user: &User) -> Result<(), Error> {
        if user.is_admin {
            self.show_menu(&[CLIENT_OPTIONS, ADMIN_OPTIONS])
        } else {
            self.show_menu(&[CLIENT_OPTIONS])
        }
    }

    // ---- Startup menu ----

    fn start_menu(&mut self) -> Result<(), Error> {
        self.show_menu(&[START_OPTIONS])?;
        loop {
            let line = self.console.ask("Enter an option: ")?;
            match StartCommand::deserialize(&line) {
                Ok(None) => {}
                Ok(Some(StartCommand::Quit)) => return Ok(()),
                Ok(Some(StartCommand::Help)) => self.show_menu(&[START_OPTIONS])?,
                Ok(Some(StartCommand::Login)) => {
                    let res = self.login();
                    if let Some(Some(user)) = self.settle(res)? {
                        self.user_menu(user)?;
                        self.show_menu(&[START_OPTIONS])?;
                    }
                }
                Ok(Some(StartCommand::NewAccount)) => {
                    let res = self.register(None);
                    if let Some(user) = self.settle(res)? {
                        self.user_menu(user)?;
                        self.show_menu(&[START_OPTIONS])?;
                    }
                }
                Err(e) => self.report(&e)?,
            }
        }
    }

    /// Log in. An unknown username may instead create that account.
    fn login(&mut self) -> Result<Option<User>, Error> {
        let username = self.console.ask_trimmed("Username: ")?;
        match self.store.find_user(&username) {
            Ok(_) => {}
            Err(Error::NoSuchUser) => {
                self.console
                    .print(&format!("No user with username '{}'.", username))?;
                let answer = self
                    .console
                    .ask("Would you like to create a new account? ")?;
                if is_yes(&answer) {
                    return self.register(Some(username)).map(Some);
                }
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        let password = self.console.ask_secret("Password: ")?;
        let user = self.store.authenticate(&username, &password)?;
        self.console
            .print(&format!("Welcome back, {}!", user.full_name))?;
        Ok(Some(user))
    }

    fn register(&mut self, username: Option<String>) -> Result<User, Error> {
        let username = match username {
            Some(name) => name,
            None => self.console.ask_trimmed("Choose a username: ")?,
        };
        // fail before asking for anything else
        validate_username(&username)?;
        match self.store.find_user(&username) {
            Ok(_) => return Err(Error::UsernameTaken),
            Err(Error::NoSuchUser) => {}
            Err(e) => return Err(e),
        }
        let full_name = self.console.ask_trimmed("Full name: ")?;
        let password = self.console.ask_secret("Choose a password: ")?;
        let user = self.store.register_user(&username, &full_name, &password)?;
        self.console
            .print(&format!("Account created. Welcome, {}!", user.full_name))?;
        Ok(user)
    }

    // ---- User menu ----

    fn user_menu(&mut self, user: User) -> Result<(), Error> {
        debug!(username = %user.username, admin = user.is_admin, "entering user menu");
        self.show_user_options(&user)?;
        loop {
            let line = self.console.ask("Enter an option: ")?;
            let cmd = match UserCommand::deserialize(&line, user.is_admin) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(e) => {
                    self.report(&e)?;
                    continue;
                }
            };
            let res = match cmd {
                UserCommand::Logout => {
                    self.console.print("Logged out.")?;
                    return Ok(());
                }
                UserCommand::Help => self.show_user_options(&user),
                UserCommand::BrowseGames => self.browse_games(),
                UserCommand::TopSellers => self.top_sellers(),
                UserCommand::ShowTiers => self.show_tiers(),
                UserCommand::ShowUsers => self.show_users(),
                UserCommand::ViewTierlist => self.view_tierlist(&user),
                UserCommand::ListTierlists => self.list_tierlists(&user),
                UserCommand::CreateTierlist => self.create_tierlist(&user),
                UserCommand::EditTierlist => self.edit_tierlist(&user),
                UserCommand::DeleteTierlist => self.delete_tierlist(&user),
                UserCommand::ChangePassword => self.change_password(&user),
                UserCommand::AddGame => self.add_game(),
                UserCommand::AddTier => self.add_tier(),
                UserCommand::ManageAdmin => self.manage_admin(&user),
            };
            self.settle(res)?;
        }
    }

    fn browse_games(&mut self) -> Result<(), Error> {
        let answer = self.console.ask("Do you want to search by name? ")?;
        let (header, games) = if is_yes(&answer) {
            let pattern = self.console.ask_trimmed("Search for: ")?;
            let games = self.store.search_games(&pattern)?;
            (format!("Games matching '{}':", pattern), games)
        } else {
            ("Video games:".to_string(), self.store.list_games()?)
        };
        if !games.is_empty() {
            self.console.print(&header)?;
        }
        self.console.print(&display::games_table(&games))
    }

    fn show_all_games(&mut self) -> Result<(), Error> {
        let games = self.store.list_games()?;
        self.console.print(&display::games_table(&games))
    }

    fn top_sellers(&mut self) -> Result<(), Error> {
        let games = self.store.top_selling_games(TOP_SELLERS_LIMIT)?;
        if !games.is_empty() {
            self.console.print("Top selling games:")?;
        }
        self.console.print(&display::games_table(&games))
    }

    fn show_tiers(&mut self) -> Result<(), Error> {
        let tiers = self.store.list_tiers()?;
        self.console
            .print(&display::tiers_table(&tiers, self.config.color))
    }

    fn show_users(&mut self) -> Result<(), Error> {
        let users = self.store.list_users()?;
        self.console.print(&display::users_table(&users))
    }

    /// Ask whose tierlist to look at, defaulting to `user`
    fn ask_owner(&mut self, user: &User) -> Result<String, Error> {
        let owner = self
            .console
            .ask_trimmed("Whose tierlists? (leave blank for your own) ")?;
        if owner.is_empty() {
            Ok(user.username.clone())
        } else {
            Ok(owner)
        }
    }

    fn show_tierlist(&mut self, owner: &str, name: &str) -> Result<(), Error> {
        let entries = self.store.tierlist_entries(owner, name)?;
        let tiers = self.store.list_tiers()?;
        self.console.print(&display::tierlist_view(
            owner,
            name,
            &tiers,
            &entries,
            self.config.color,
        ))
    }

    fn view_tierlist(&mut self, user: &User) -> Result<(), Error> {
        let owner = self.ask_owner(user)?;
        let name = self.console.ask_trimmed("Tierlist name: ")?;
        self.show_tierlist(&owner, &name)
    }

    fn list_tierlists(&mut self, user: &User) -> Result<(), Error> {
        let owner = self.ask_owner(user)?;
        let lists = self.store.list_tierlists(&owner)?;
        self.console
            .print(&display::tierlists_table(&owner, &lists))
    }

    fn create_tierlist(&mut self, user: &User) -> Result<(), Error> {
        let name = self.console.ask_trimmed("Name for the new tierlist: ")?;
        let list = self.store.create_tierlist(&user.username, &name)?;
        self.console
            .print(&format!("Created tierlist '{}'.", list.tierlist_name))?;
        let answer = self.console.ask("Would you like to edit it now? ")?;
        if is_yes(&answer) {
            self.edit_menu(user, &list.tierlist_name)?;
        }
        Ok(())
    }

    fn edit_tierlist(&mut self, user: &User) -> Result<(), Error> {
        let name = self.console.ask_trimmed("Which tierlist? ")?;
        // make sure it exists and is owned by the user before entering the menu
        self.store.tierlist_entries(&user.username, &name)?;
        self.edit_menu(user, &name)
    }

    fn delete_tierlist(&mut self, user: &User) -> Result<(), Error> {
        let name = self.console.ask_trimmed("Which tierlist? ")?;
        let entries = self.store.tierlist_entries(&user.username, &name)?;
        let answer = self.console.ask(&format!(
            "Delete '{}' and its {}? ",
            name,
            display::plural(entries.len(), "game")
        ))?;
        if !is_yes(&answer) {
            return self.console.print("Nothing deleted.");
        }
        self.store.delete_tierlist(&user.username, &name)?;
        self.console
            .print(&format!("Deleted tierlist '{}'.", name))
    }

    fn change_password(&mut self, user: &User) -> Result<(), Error> {
        let current = self.console.ask_secret("Current password: ")?;
        self.store.authenticate(&user.username, &current)?;
        let password = self.console.ask_secret("New password: ")?;
        let repeated = self.console.ask_secret("Repeat new password: ")?;
        if password != repeated {
            return self.console.print("Passwords don't match.");
        }
        self.store.change_password(&user.username, &password)?;
        self.console.print("Password changed.")
    }

    // ---- Admin options ----

    fn add_game(&mut self) -> Result<(), Error> {
        let name = self.console.ask_trimmed("Game name: ")?;
        let developer = self.console.ask_trimmed("Developer: ")?;
        let publisher = self.console.ask_trimmed("Publisher: ")?;
        let release_date = self.console.ask_trimmed("Release date (YYYY-MM-DD): ")?;
        let release_date = NaiveDate::parse_from_str(&release_date, "%Y-%m-%d")?;
        let sales = self.console.ask_number::<i64>("Copies sold: ")?;
        let platform = self.console.ask_trimmed("Platform: ")?;
        let game = self.store.add_game(&NewVideoGame {
            name: &name,
            developer: &developer,
            publisher: &publisher,
            release_date,
            sales,
            platform: &platform,
        })?;
        self.console
            .print(&format!("Added game [{}] {}.", game.game_id, game.name))
    }

    fn add_tier(&mut self) -> Result<(), Error> {
        let tier_rank = self
            .console
            .ask_number::<i32>("Rank (0 is the best tier): ")?;
        let name = self.console.ask_trimmed("Tier name: ")?;
        let color = self.console.ask_trimmed("Colour (#rrggbb): ")?;
        let tier = self.store.add_tier(&NewTier {
            tier_rank,
            name: &name,
            color: &color,
        })?;
        let painted = display::paint(&tier.name, &tier.color, self.config.color);
        self.console
            .print(&format!("Added tier {} at rank {}.", painted, tier.tier_rank))
    }

    fn manage_admin(&mut self, user: &User) -> Result<(), Error> {
        let username = self.console.ask_trimmed("Username: ")?;
        if username == user.username {
            return Err(Error::CantChangeOwnAdmin);
        }
        let target = self.store.find_user(&username)?;
        let grant = !target.is_admin;
        let question = if grant {
            format!("Make '{}' an admin? ", target.username)
        } else {
            format!("'{}' is an admin. Revoke admin? ", target.username)
        };
        let answer = self.console.ask(&question)?;
        if !is_yes(&answer) {
            return self.console.print("Nothing changed.");
        }
        self.store.set_admin(&target.username, grant)?;
        if grant {
            self.console
                .print(&format!("'{}' is now an admin.", target.username))
        } else {
            self.console
                .print(&format!("'{}' is no longer an admin.", target.username))
        }
    }

    // ---- Edit tierlist menu ----

    fn edit_menu(&mut self, user: &User, name: &str) -> Result<(), Error> {
        self.console.print(&format!("Editing '{}'.", name))?;
        self.show_menu(&[EDIT_OPTIONS])?;
        loop {
            let line = self.console.ask("Enter an option: ")?;
            let cmd = match EditCommand::deserialize(&line) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(e) => {
                    self.report(&e)?;
                    continue;
                }
            };
            let res = match cmd {
                EditCommand::Back => {
                    self.show_user_options(user)?;
                    return Ok(());
                }
                EditCommand::Help => self.show_menu(&[EDIT_OPTIONS]),
                EditCommand::View => self.show_tierlist(&user.username, name),
                EditCommand::ShowGames => self.show_all_games(),
                EditCommand::ShowTiers => self.show_tiers(),
                EditCommand::Assign => self.assign_game(user, name),
                EditCommand::Move => self.move_game(user, name),
                EditCommand::Remove => self.remove_game(user, name),
            };
            self.settle(res)?;
        }
    }

    /// Ask for a tier by name (case insensitive)
    fn ask_tier(&mut self) -> Result<Tier, Error> {
        let name = self.console.ask_trimmed("Tier: ")?.to_lowercase();
        let tiers = self.store.list_tiers()?;
        tiers
            .into_iter()
            .find(|t| t.name.to_lowercase() == name)
            .ok_or(Error::NoSuchTier)
    }

    fn ask_game_id(&mut self) -> Result<GameId, Error> {
        self.console.ask_number::<GameId>("Game id: ")
    }

    fn assign_game(&mut self, user: &User, name: &str) -> Result<(), Error> {
        let game_id = self.ask_game_id()?;
        let tier = self.ask_tier()?;
        self.store
            .assign_game(&user.username, name, game_id, tier.tier_id)?;
        self.console
            .print(&format!("Placed game {} in tier {}.", game_id, tier.name))
    }

    fn move_game(&mut self, user: &User, name: &str) -> Result<(), Error> {
        let game_id = self.ask_game_id()?;
        let tier = self.ask_tier()?;
        self.store
            .move_game(&user.username, name, game_id, tier.tier_id)?;
        self.console
            .print(&format!("Moved game {} to tier {}.", game_id, tier.name))
    }

    fn remove_game(&mut self, user: &User, name: &str) -> Result<(), Error> {
        let game_id = self.ask_game_id()?;
        self.store.remove_game(&user.username, name, game_id)?;
        self.console
            .print(&format!("Removed game {} from '{}'.", game_id, name))
    }
}
