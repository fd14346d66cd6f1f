//! `?room=CODE` join links, the payload a QR encoder would carry.

use url::Url;

use crate::room_code::RoomCode;

const ROOM_PARAM: &str = "room";

/// Appends (or replaces) the `room` query parameter on `base`.
pub fn join_url(base: &str, code: &RoomCode) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != ROOM_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(ROOM_PARAM, code.as_str());
    Ok(url)
}

/// Extracts a valid room code from a join link, if it carries one.
pub fn room_from_url(link: &str) -> Option<RoomCode> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == ROOM_PARAM)
        .and_then(|(_, value)| RoomCode::parse(&value).ok())
}
