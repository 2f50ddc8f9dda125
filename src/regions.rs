//! Districts (kecamatan) of Sorong city and their sub-districts (kelurahan).

const DISTRICTS: &[(&str, &[&str])] = &[
    ("Sorong", &["Klademak", "Kofkerbu", "Remu", "Remu Utara"]),
    ("Sorong Kota", &["Kampung Baru", "Klabala", "Klakublik", "Klasuur"]),
    (
        "Sorong Manoi",
        &["Klaligi", "Klasabi", "Malabutor", "Malawei", "Remu Selatan"],
    ),
    ("Sorong Timur", &["Kladufu", "Klamana", "Klawalu", "Klawuyuk"]),
    ("Klaurung", &["Giwu", "Klablim", "Klasaman", "Klasuat"]),
    ("Malaimsimsa", &["Klabulu", "Klagete", "Malaingkedi", "Malamso"]),
    ("Sorong Utara", &["Matalamagi", "Malasilen", "Malanu", "Sawagumu"]),
    (
        "Sorong Barat",
        &["Klawasi", "Rufei", "Pal Putih", "Puncak Cendrawasih"],
    ),
    ("Sorong Kepulauan", &["Dum Barat", "Dum Timur", "Raam", "Soop"]),
    (
        "Maladum Mes",
        &["Saoka", "Suprau", "Tampa Garam", "Tanjung Kasuari"],
    ),
];

pub fn sub_districts(district: &str) -> Option<&'static [&'static str]> {
    DISTRICTS
        .iter()
        .find(|(name, _)| *name == district)
        .map(|(_, subs)| *subs)
}

/// First district and its first sub-district.
pub fn default_location() -> (&'static str, &'static str) {
    let (district, subs) = DISTRICTS[0];
    (district, subs[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(DISTRICTS.len(), 10);
        assert_eq!(sub_districts("Sorong Manoi").map(|s| s.len()), Some(5));
        assert!(sub_districts("Sorong Barat")
            .unwrap()
            .contains(&"Puncak Cendrawasih"));
        assert!(sub_districts("Jayapura").is_none());
        assert_eq!(default_location(), ("Sorong", "Klademak"));
    }
}
