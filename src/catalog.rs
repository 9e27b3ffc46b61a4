//! Built-in batches.
//!
//! These are the prompt lists the tool ships with; anything else comes in
//! through a JSON manifest.

use crate::batch::WorkItem;

/// A named, fixed list of prompts.
///
/// The site these batches were written for references `<name>.webp`. No
/// conversion happens, so runs default to `png` (what Gemini returns); pass
/// `--format webp` or set `GENBATCH_FORMAT=webp` to get the site's names.
#[derive(Debug, Clone, Copy)]
pub struct Batch {
    /// Name used on the command line.
    pub name: &'static str,
    /// One-line description for `list`.
    pub description: &'static str,
    /// Style label shown next to each item while generating.
    pub style: Option<&'static str>,
    entries: &'static [(&'static str, &'static str)],
}

impl Batch {
    /// Returns the batch as owned work items, in order.
    pub fn items(&self) -> Vec<WorkItem> {
        self.entries
            .iter()
            .map(|(name, prompt)| WorkItem::new(*name, *prompt))
            .collect()
    }

    /// Number of items in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the batch has no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Name of the batch used when none is given.
pub const DEFAULT_BATCH: &str = "products";

const PRODUCTS: Batch = Batch {
    name: "products",
    description: "Product shots, hero banner and logo",
    style: None,
    entries: &[
        (
            "corn-tortillas",
            "Professional product photography of authentic Mexican corn tortillas stacked in a traditional style, warm golden color, on a rustic wooden surface with soft natural lighting, high resolution, commercial quality, appetizing presentation, slight steam visible suggesting freshness",
        ),
        (
            "flour-tortillas",
            "Professional product photography of soft buttery flour tortillas in a family-sized stack, creamy white color with light golden spots, on a clean kitchen counter with warm lighting, high resolution, commercial quality, showing the soft flexible texture",
        ),
        (
            "hero-banner",
            "Wide banner image of a Texas ranch scene at golden hour with a rustic wooden table displaying fresh tortillas, salsa bowls, and ingredients, warm inviting atmosphere, professional food photography style, wide aspect ratio 16:9",
        ),
        (
            "logo",
            "Modern minimalist logo design for \"Tortilla Rodeo Co.\" featuring a stylized tortilla with subtle Texas elements like a star or lasso, warm earth tones, professional branding, clean vector style, suitable for web use",
        ),
    ],
};

const EPIC: Batch = Batch {
    name: "epic",
    description: "Cinematic imagery for landing page sections",
    style: Some("Cinematic & Premium"),
    entries: &[
        (
            "masa-preparation",
            "Cinematic close-up of hands preparing traditional corn masa dough, dramatic lighting, artisanal process, steam rising, golden hour lighting, professional food photography, shallow depth of field, premium quality, 8k resolution",
        ),
        (
            "texas-field",
            "Epic wide shot of golden corn fields in Texas at sunset, dramatic sky, lone windmill silhouette, cinematic landscape photography, warm golden tones, professional grade, atmospheric haze, ultra high resolution",
        ),
        (
            "tortilla-stack",
            "Artistic macro shot of perfectly stacked fresh corn tortillas with visible texture and char marks, dramatic side lighting creating shadows, minimalist black background, premium product photography, ultra sharp detail",
        ),
        (
            "artisan-hands",
            "Black and white photograph of weathered artisan hands pressing tortilla dough on traditional comal, dramatic contrast, fine art photography style, capturing the craft and tradition, professional lighting",
        ),
        (
            "fresh-ingredients",
            "Overhead flat lay of premium tortilla ingredients - heirloom corn, lime, salt arranged artistically on dark slate, moody lighting, editorial food photography style, rich textures, professional styling",
        ),
        (
            "cooking-flame",
            "Dramatic shot of tortilla cooking over open flame on traditional comal, fire glow, smoke wisps, dark moody background, cinematic lighting, capturing the authentic cooking process, high contrast",
        ),
        (
            "heritage-kitchen",
            "Atmospheric wide shot of traditional Texas kitchen with hanging dried corn, vintage tools, warm window light streaming in, rustic authentic setting, documentary style photography, rich warm tones",
        ),
        (
            "product-hero",
            "Premium product shot of tortillas arranged in elegant spiral pattern on marble surface, professional studio lighting, minimalist aesthetic, luxury food photography, perfect for hero section",
        ),
        (
            "texture-detail",
            "Extreme macro shot showing the beautiful texture and bubbles of a perfectly cooked flour tortilla, artistic lighting highlighting every detail, abstract food art photography, museum quality",
        ),
        (
            "ranch-sunset",
            "Epic cinematic shot of Texas ranch at golden hour with rustic barn and fence in foreground, vast sky with dramatic clouds, warm nostalgic tones, professional landscape photography, establishing shot feel",
        ),
    ],
};

const BATCHES: &[Batch] = &[PRODUCTS, EPIC];

/// Returns all built-in batches.
pub fn all() -> &'static [Batch] {
    BATCHES
}

/// Looks up a built-in batch by name.
pub fn find(name: &str) -> Option<&'static Batch> {
    BATCHES.iter().find(|b| b.name == name)
}
