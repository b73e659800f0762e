//! House games: the static catalog and the dice game.
//!
//! Most games are frontend-rendered pages with no server-side logic; the
//! catalog here is what backs their listing/detail routes. Dice is the one
//! game settled on the server.

pub mod dice;

use serde::Serialize;
use utoipa::ToSchema;

/// Descriptor for a game page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameInfo {
    /// URL slug, e.g. "dice"
    pub slug: &'static str,
    pub title: &'static str,
    pub blurb: &'static str,
    /// Whether the server settles bets for this game
    pub playable: bool,
}

/// All game pages served by the site
pub const CATALOG: &[GameInfo] = &[
    GameInfo {
        slug: "dice",
        title: "Dice",
        blurb: "Roll over or under your target. Exact hits go to the house.",
        playable: true,
    },
    GameInfo {
        slug: "crash",
        title: "Crash",
        blurb: "Cash out before the multiplier crashes.",
        playable: false,
    },
    GameInfo {
        slug: "plinko",
        title: "Plinko",
        blurb: "Drop a ball, watch it bounce.",
        playable: false,
    },
    GameInfo {
        slug: "roulette",
        title: "Roulette",
        blurb: "Red, black, or a long-shot straight-up number.",
        playable: false,
    },
];

/// Look up a game descriptor by slug
pub fn find(slug: &str) -> Option<&'static GameInfo> {
    CATALOG.iter().find(|g| g.slug == slug)
}
