/// Hash an actor name the way the game's actor info does (CRC-32, IEEE polynomial).
///
/// The hash is case-sensitive and computed over the UTF-8 bytes of the name.
pub fn actor_hash(name: &str) -> u32 {
    crc32fast::hash(name.as_bytes())
}
