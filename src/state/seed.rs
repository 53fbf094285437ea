//! The built-in travel slideshow.

use tracing::info;

use super::data::SlideRecord;
use super::library::SlideLibrary;
use crate::error::Result;

const DESTINATIONS: [(&str, &str); 5] = [
    (
        "Langkawi, Malaysia: Relax in the great outdoors",
        "Lovers of the great outdoors can get their travel fix in the Langkawi archipelago in Malaysia, a destination known for its staggering limestone cliffs, lush greenery, and jaw-dropping natural geological formations.",
    ),
    (
        "Galle, Sri Lanka: Relax in historic luxury",
        "The city of Galle on the southwest coast of Sri Lanka is perfect for the traveler looking for a little luxury and a spot of relaxation.",
    ),
    (
        "Bagan, Myanmar: High flying relaxation",
        "Travelers seeking remote adventure and laid-back discovery would be correct in adding Bagan to their list of most relaxing places.",
    ),
    (
        "Nachi Falls, Japan: Sacred and serene wonders",
        "The exquisite Nachi Falls in Japan are a magnificent sight to behold. Hidden away in the Nachi Primeval Forest, the waterfall features an incredible 133-meter drop.",
    ),
    (
        "Lake Bled, Slovenia: As peaceful and pretty as it looks",
        "Built in the 15th century, the church on Bled Island is a much-loved landmark in Slovenia. This destination is every bit as charming (and peaceful) as its picture suggests.",
    ),
];

/// The five destination slides shipped with the viewer.
pub fn default_slides() -> Vec<SlideRecord> {
    DESTINATIONS
        .iter()
        .enumerate()
        .map(|(i, (title, body))| {
            SlideRecord::new(
                format!("resources/TestImage{}.jpg", i + 1),
                format!("{title}\n{body}"),
            )
        })
        .collect()
}

/// Insert the default slides if the catalog is empty.
///
/// Returns how many slides were added.
pub fn seed_defaults(library: &mut SlideLibrary) -> Result<usize> {
    if library.slide_count()? > 0 {
        return Ok(0);
    }
    let added = library.insert_many(&default_slides())?.len();
    info!("Seeded catalog with {} default slides", added);
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::SlideRepository;

    #[test]
    fn test_default_slides() {
        let slides = default_slides();
        assert_eq!(slides.len(), 5);
        assert_eq!(slides[0].image_path, "resources/TestImage1.jpg");
        assert!(slides[4].description.starts_with("Lake Bled"));
    }

    #[test]
    fn test_seed_only_once() {
        let mut library = SlideLibrary::open_in_memory().unwrap();
        assert_eq!(seed_defaults(&mut library).unwrap(), 5);
        assert_eq!(seed_defaults(&mut library).unwrap(), 0);
        assert_eq!(library.list_slides().unwrap().len(), 5);
    }
}
