//! Domain models — user accounts and hotel rooms.

use serde::{Deserialize, Serialize};

/// Image identifier used when a room row predates the image column.
pub const PLACEHOLDER_IMAGE: &str = "room_placeholder";

/// A registered user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique ID, assigned by the database.
    pub id: i64,
    /// Login name, unique across all users.
    pub username: String,
    /// Password, stored and compared verbatim (no hashing in this app).
    pub password: String,
    /// Display name.
    pub fullname: String,
}

/// A hotel room as shown in listings and detail views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique ID, assigned by the database.
    pub id: i64,
    /// Room label, e.g. "101". Conventionally distinct, not enforced.
    pub number: String,
    /// Maximum number of guests.
    pub capacity: u32,
    /// Per-day rate.
    pub price: f64,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the room can currently be booked. Set independently,
    /// not derived from bookings.
    pub is_available: bool,
    /// Comma-separated amenity list, e.g. "WiFi, ТВ".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<String>,
    /// Image asset identifier, e.g. "room_101". Resolved to a static
    /// asset by the presentation layer.
    pub image_res: String,
}
