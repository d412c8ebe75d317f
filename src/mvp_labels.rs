use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Season label → NBA stats PLAYER_ID of that season's MVP. Label quality
/// for the whole pipeline hangs on this table; the updater refuses to write
/// a season whose mapped id matches no fetched row.
static MVPS_BY_SEASON: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("1996-97", 252),     // Karl Malone
        ("1997-98", 893),     // Michael Jordan
        ("1998-99", 252),     // Karl Malone
        ("1999-00", 406),     // Shaquille O'Neal
        ("2000-01", 947),     // Allen Iverson
        ("2001-02", 1495),    // Tim Duncan
        ("2002-03", 1495),    // Tim Duncan
        ("2003-04", 708),     // Kevin Garnett
        ("2004-05", 959),     // Steve Nash
        ("2005-06", 959),     // Steve Nash
        ("2006-07", 1717),    // Dirk Nowitzki
        ("2007-08", 977),     // Kobe Bryant
        ("2008-09", 2544),    // LeBron James
        ("2009-10", 2544),    // LeBron James
        ("2010-11", 201565),  // Derrick Rose
        ("2011-12", 2544),    // LeBron James
        ("2012-13", 2544),    // LeBron James
        ("2013-14", 201142),  // Kevin Durant
        ("2014-15", 201939),  // Stephen Curry
        ("2015-16", 201939),  // Stephen Curry
        ("2016-17", 201566),  // Russell Westbrook
        ("2017-18", 201935),  // James Harden
        ("2018-19", 203507),  // Giannis Antetokounmpo
        ("2019-20", 203507),  // Giannis Antetokounmpo
        ("2020-21", 203999),  // Nikola Jokic
        ("2021-22", 203999),  // Nikola Jokic
        ("2022-23", 203954),  // Joel Embiid
        ("2023-24", 203999),  // Nikola Jokic
        ("2024-25", 1628983), // Shai Gilgeous-Alexander
    ])
});

pub fn mvp_player_id(season: &str) -> Option<u32> {
    MVPS_BY_SEASON.get(season).copied()
}

#[cfg(test)]
mod tests {
    use super::mvp_player_id;

    #[test]
    fn known_seasons_resolve() {
        assert_eq!(mvp_player_id("1997-98"), Some(893));
        assert_eq!(mvp_player_id("2023-24"), Some(203999));
        assert_eq!(mvp_player_id("1950-51"), None);
    }
}
