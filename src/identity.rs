use md5::{Digest, Md5};

/// Hex characters kept from the digest.
pub const ID_LEN: usize = 12;

/// Content fingerprint of a sighting.
///
/// Only species, location, date and observer take part, so two sightings that
/// agree on those four values share an id and collapse into one record on
/// merge. Pass an empty observer when none is known.
pub fn sighting_id(species: &str, location: &str, date: &str, observer: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("{species}_{location}_{date}_{observer}").as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ID_LEN);
    id
}
