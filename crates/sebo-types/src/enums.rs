use serde::{Deserialize, Serialize};

/// Book genre. Stored as the kebab-case string, same form on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Romance,
    Fantasy,
    ScienceFiction,
    Thriller,
    Horror,
    Biography,
    SelfHelp,
    Technical,
    Children,
    Other,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Romance => "romance",
            Genre::Fantasy => "fantasy",
            Genre::ScienceFiction => "science-fiction",
            Genre::Thriller => "thriller",
            Genre::Horror => "horror",
            Genre::Biography => "biography",
            Genre::SelfHelp => "self-help",
            Genre::Technical => "technical",
            Genre::Children => "children",
            Genre::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "romance" => Genre::Romance,
            "fantasy" => Genre::Fantasy,
            "science-fiction" => Genre::ScienceFiction,
            "thriller" => Genre::Thriller,
            "horror" => Genre::Horror,
            "biography" => Genre::Biography,
            "self-help" => Genre::SelfHelp,
            "technical" => Genre::Technical,
            "children" => Genre::Children,
            "other" => Genre::Other,
            _ => return None,
        })
    }
}

/// Physical condition of the offered book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    Used,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::LikeNew => "like-new",
            Condition::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "new" => Condition::New,
            "like-new" => Condition::LikeNew,
            "used" => Condition::Used,
            _ => return None,
        })
    }
}

/// What the owner wants to do with the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingKind {
    Sale,
    Trade,
    PurchaseWanted,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Sale => "sale",
            ListingKind::Trade => "trade",
            ListingKind::PurchaseWanted => "purchase-wanted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "sale" => ListingKind::Sale,
            "trade" => ListingKind::Trade,
            "purchase-wanted" => ListingKind::PurchaseWanted,
            _ => return None,
        })
    }
}

/// Rating level. Clients speak numeric 1..5; the store holds the named
/// level. This type is the only translation point between the two forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatingLevel {
    Terrible,
    Poor,
    Average,
    Good,
    Excellent,
}

impl RatingLevel {
    /// Numeric form used on the public API.
    pub fn value(&self) -> u8 {
        match self {
            RatingLevel::Terrible => 1,
            RatingLevel::Poor => 2,
            RatingLevel::Average => 3,
            RatingLevel::Good => 4,
            RatingLevel::Excellent => 5,
        }
    }

    pub fn from_value(v: u8) -> Option<Self> {
        Some(match v {
            1 => RatingLevel::Terrible,
            2 => RatingLevel::Poor,
            3 => RatingLevel::Average,
            4 => RatingLevel::Good,
            5 => RatingLevel::Excellent,
            _ => return None,
        })
    }

    /// Named form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingLevel::Terrible => "terrible",
            RatingLevel::Poor => "poor",
            RatingLevel::Average => "average",
            RatingLevel::Good => "good",
            RatingLevel::Excellent => "excellent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "terrible" => RatingLevel::Terrible,
            "poor" => RatingLevel::Poor,
            "average" => RatingLevel::Average,
            "good" => RatingLevel::Good,
            "excellent" => RatingLevel::Excellent,
            _ => return None,
        })
    }
}
