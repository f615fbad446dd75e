use crate::error::Error;

/// A menu entry: the letter that selects it and its description
pub type MenuOption = (char, &'static str);

pub const START_OPTIONS: &[MenuOption] = &[
    ('l', "log in"),
    ('n', "create a new account"),
    ('h', "show these options"),
    ('q', "quit"),
];

pub const CLIENT_OPTIONS: &[MenuOption] = &[
    ('g', "browse video games"),
    ('s', "show top selling games"),
    ('t', "show tiers"),
    ('u', "show users"),
    ('v', "view a tierlist"),
    ('l', "list tierlists"),
    ('c', "create a tierlist"),
    ('e', "edit one of your tierlists"),
    ('d', "delete one of your tierlists"),
    ('p', "change your password"),
    ('h', "show these options"),
    ('q', "log out"),
];

pub const ADMIN_OPTIONS: &[MenuOption] = &[
    ('a', "add a video game"),
    ('n', "add a tier"),
    ('m', "grant or revoke admin for a user"),
];

pub const EDIT_OPTIONS: &[MenuOption] = &[
    ('v', "view this tierlist"),
    ('a', "assign a game to a tier"),
    ('m', "move a game to another tier"),
    ('d', "remove a game from this tierlist"),
    ('g', "show video games"),
    ('t', "show tiers"),
    ('h', "show these options"),
    ('q', "back"),
];

/// A command on the startup menu
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum StartCommand {
    Login,
    NewAccount,
    Help,
    Quit,
}

/// A command on the menu shown once logged in
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum UserCommand {
    BrowseGames,
    TopSellers,
    ShowTiers,
    ShowUsers,
    ViewTierlist,
    ListTierlists,
    CreateTierlist,
    EditTierlist,
    DeleteTierlist,
    ChangePassword,
    Help,
    Logout,
    /// Admin only
    AddGame,
    /// Admin only
    AddTier,
    /// Admin only
    ManageAdmin,
}

/// A command on the menu for editing one tierlist
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum EditCommand {
    View,
    Assign,
    Move,
    Remove,
    ShowGames,
    ShowTiers,
    Help,
    Back,
}

/// The letter selecting an option: the first non whitespace character of the line, lowercased.
/// None for a blank line.
fn option_char(line: &str) -> Option<char> {
    line.trim()
        .chars()
        .next()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
}

impl StartCommand {
    /// Parse a line typed at the startup menu. Blank lines parse to None.
    pub fn deserialize(line: &str) -> Result<Option<StartCommand>, Error> {
        use StartCommand::*;
        let c = match option_char(line) {
            None => return Ok(None),
            Some(c) => c,
        };
        match c {
            'l' => Ok(Some(Login)),
            'n' => Ok(Some(NewAccount)),
            'h' => Ok(Some(Help)),
            'q' => Ok(Some(Quit)),
            _ => Err(Error::UnknownOption),
        }
    }
}

impl UserCommand {
    /// Parse a line typed at the user menu. Admin commands are only recognized when `is_admin` is set.
    pub fn deserialize(line: &str, is_admin: bool) -> Result<Option<UserCommand>, Error> {
        use UserCommand::*;
        let c = match option_char(line) {
            None => return Ok(None),
            Some(c) => c,
        };
        let cmd = match c {
            'g' => BrowseGames,
            's' => TopSellers,
            't' => ShowTiers,
            'u' => ShowUsers,
            'v' => ViewTierlist,
            'l' => ListTierlists,
            'c' => CreateTierlist,
            'e' => EditTierlist,
            'd' => DeleteTierlist,
            'p' => ChangePassword,
            'h' => Help,
            'q' => Logout,
            'a' => AddGame,
            'n' => AddTier,
            'm' => ManageAdmin,
            _ => return Err(Error::UnknownOption),
        };
        if cmd.is_admin_only() && !is_admin {
            return Err(Error::UnknownOption);
        }
        Ok(Some(cmd))
    }

    pub fn is_admin_only(&self) -> bool {
        match self {
            UserCommand::AddGame | UserCommand::AddTier | UserCommand::ManageAdmin => true,
            _ => false,
        }
    }
}

impl EditCommand {
    /// Parse a line typed at the tierlist editing menu
    pub fn deserialize(line: &str) -> Result<Option<EditCommand>, Error> {
        use EditCommand::*;
        let c = match option_char(line) {
            None => return Ok(None),
            Some(c) => c,
        };
        match c {
            'v' => Ok(Some(View)),
            'a' => Ok(Some(Assign)),
            'm' => Ok(Some(Move)),
            'd' => Ok(Some(Remove)),
            'g' => Ok(Some(ShowGames)),
            't' => Ok(Some(ShowTiers)),
            'h' => Ok(Some(Help)),
            'q' => Ok(Some(Back)),
            _ => Err(Error::UnknownOption),
        }
    }
}

/// Interpret a yes/no answer. Anything starting with y is yes.
pub fn is_yes(answer: &str) -> bool {
    option_char(answer) == Some('y')
}
