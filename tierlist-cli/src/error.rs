use bcrypt;
use diesel;
use r2d2;

use std::fmt;
use std::io;
use std::num::ParseIntError;

#[derive(Debug)]
pub enum Error {
    DBError(diesel::result::Error),
    R2D2Error(r2d2::Error),
    BCryptError(bcrypt::BcryptError),
    IoError(io::Error),
    /// stdin reached end of file
    InputClosed,
    UnknownOption,
    InvalidNumberId,
    InvalidDate(String),
    MissingField(&'static str),
    FieldTooLong {
        field: &'static str,
        max: usize,
    },
    InvalidUsername,
    PasswordTooShort {
        min: usize,
    },
    NoSuchUser,
    IncorrectCredentials,
    UsernameTaken,
    CantChangeOwnAdmin,
    NoSuchGame,
    NegativeSales,
    FutureReleaseDate,
    NoSuchTier,
    InvalidTierRank,
    InvalidColor(String),
    TierRankTaken,
    TierNameTaken,
    NoSuchTierlist,
    TierlistExists,
    GameAlreadyInTierlist,
    GameNotInTierlist,
}

impl Error {
    /// Whether the message is safe and useful to show to an end user. Errors
    /// coming out of the database driver, connection pool, hashing or the
    /// terminal are not.
    pub fn is_user_facing(&self) -> bool {
        use Error::*;
        match self {
            DBError(_) | R2D2Error(_) | BCryptError(_) | IoError(_) => false,
            _ => true,
        }
    }

    /// Whether the error ends the interactive session rather than just the
    /// current operation.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::InputClosed | Error::IoError(_) => true,
            _ => false,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        use Error::*;
        match (self, other) {
            (DBError(_), DBError(_)) => true,
            (R2D2Error(_), R2D2Error(_)) => true,
            (BCryptError(_), BCryptError(_)) => true,
            (IoError(a), IoError(b)) => a.kind() == b.kind(),
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (MissingField(a), MissingField(b)) => a == b,
            (
                FieldTooLong { field, max },
                FieldTooLong {
                    field: other_field,
                    max: other_max,
                },
            ) => field == other_field && max == other_max,
            (PasswordTooShort { min }, PasswordTooShort { min: other_min }) => min == other_min,
            (InvalidColor(a), InvalidColor(b)) => a == b,
            (InputClosed, InputClosed)
            | (UnknownOption, UnknownOption)
            | (InvalidNumberId, InvalidNumberId)
            | (InvalidUsername, InvalidUsername)
            | (NoSuchUser, NoSuchUser)
            | (IncorrectCredentials, IncorrectCredentials)
            | (UsernameTaken, UsernameTaken)
            | (CantChangeOwnAdmin, CantChangeOwnAdmin)
            | (NoSuchGame, NoSuchGame)
            | (NegativeSales, NegativeSales)
            | (FutureReleaseDate, FutureReleaseDate)
            | (NoSuchTier, NoSuchTier)
            | (InvalidTierRank, InvalidTierRank)
            | (TierRankTaken, TierRankTaken)
            | (TierNameTaken, TierNameTaken)
            | (NoSuchTierlist, NoSuchTierlist)
            | (TierlistExists, TierlistExists)
            | (GameAlreadyInTierlist, GameAlreadyInTierlist)
            | (GameNotInTierlist, GameNotInTierlist) => true,
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Error {
        Error::DBError(e)
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(e: bcrypt::BcryptError) -> Error {
        Error::BCryptError(e)
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Error {
        Error::R2D2Error(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::IoError(e)
    }
}

impl From<ParseIntError> for Error {
    fn from(_e: ParseIntError) -> Error {
        Error::InvalidNumberId
    }
}

impl From<chrono::ParseError> for Error {
    fn from(e: chrono::ParseError) -> Error {
        Error::InvalidDate(e.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            DBError(e) => write!(f, "database error: {}", *e),
            R2D2Error(_) => write!(
                f,
                "database pool error: could not establish database connection"
            ),
            BCryptError(e) => write!(f, "bcrypt error: {}", *e),
            IoError(e) => write!(f, "i/o error: {}", *e),
            InputClosed => write!(f, "input closed"),
            UnknownOption => write!(f, "unknown option"),
            InvalidNumberId => write!(f, "malformed id or number"),
            InvalidDate(e) => write!(f, "invalid date (expected YYYY-MM-DD): {}", *e),
            MissingField(field) => write!(f, "{} must not be empty", *field),
            FieldTooLong { field, max } => {
                write!(f, "{} must be at most {} characters", *field, *max)
            }
            InvalidUsername => write!(
                f,
                "usernames are 1 to 20 letters, digits or underscores"
            ),
            PasswordTooShort { min } => {
                write!(f, "passwords must be at least {} characters", *min)
            }
            NoSuchUser => write!(f, "no such user"),
            IncorrectCredentials => write!(f, "incorrect login credentials"),
            UsernameTaken => write!(f, "that username is already taken"),
            CantChangeOwnAdmin => write!(f, "you can't change your own admin status"),
            NoSuchGame => write!(f, "no such game"),
            NegativeSales => write!(f, "sales can't be negative"),
            FutureReleaseDate => write!(f, "release date can't be in the future"),
            NoSuchTier => write!(f, "no such tier"),
            InvalidTierRank => write!(f, "tier ranks can't be negative"),
            InvalidColor(color) => write!(
                f,
                "invalid colour {} (expected #rrggbb)",
                *color
            ),
            TierRankTaken => write!(f, "a tier with that rank already exists"),
            TierNameTaken => write!(f, "a tier with that name already exists"),
            NoSuchTierlist => write!(f, "no such tierlist"),
            TierlistExists => write!(f, "you already have a tierlist with that name"),
            GameAlreadyInTierlist => write!(f, "that game is already in the tierlist"),
            GameNotInTierlist => write!(f, "that game isn't in the tierlist"),
        }
    }
}
