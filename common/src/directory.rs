use serde::{Deserialize, Serialize};

use crate::identity::IndustryId;
use crate::product::{Product, ProductCategory, ProductId};

const DEMO_CATALOG: &str = include_str!("../data/industries.json");

/// Registration documents a seller publishes with its listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Licenses {
    pub gst_number: String,
    pub factory_license: String,
    pub trade_license: String,
}

/// A seller business and the chemicals it lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Industry {
    pub id: IndustryId,
    pub name: String,
    /// Initials shown in place of a logo image.
    pub logo: String,
    pub location: String,
    pub licenses: Licenses,
    pub phone: String,
    pub email: String,
    pub verified: bool,
    pub rating: f32,
    pub products: Vec<Product>,
}

impl Industry {
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn categories(&self) -> Vec<&ProductCategory> {
        let mut categories: Vec<&ProductCategory> = Vec::new();
        for product in &self.products {
            if !categories.contains(&&product.category) {
                categories.push(&product.category);
            }
        }
        categories
    }
}

/// A search hit: the product together with the business that lists it.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    pub industry: &'a Industry,
    pub product: &'a Product,
}

/// The marketplace catalog of seller businesses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    entries: Vec<Industry>,
}

impl Directory {
    pub fn new(entries: Vec<Industry>) -> Self {
        Self { entries }
    }

    /// The catalog bundled with the crate for demonstrations.
    pub fn demo() -> Result<Self, serde_json::Error> {
        serde_json::from_str(DEMO_CATALOG)
    }

    /// All industries sorted by name.
    pub fn industries(&self) -> Vec<&Industry> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn industry(&self, id: &IndustryId) -> Option<&Industry> {
        self.entries.iter().find(|i| &i.id == id)
    }

    pub fn product(&self, industry: &IndustryId, product: &ProductId) -> Option<Listing<'_>> {
        let industry = self.industry(industry)?;
        let product = industry.product(product)?;
        Some(Listing { industry, product })
    }

    pub fn listings(&self) -> impl Iterator<Item = Listing<'_>> {
        self.entries.iter().flat_map(|industry| {
            industry
                .products
                .iter()
                .map(move |product| Listing { industry, product })
        })
    }

    /// Case-insensitive search over product name and category.
    pub fn search(&self, query: &str) -> Vec<Listing<'_>> {
        self.listings().filter(|l| l.product.matches(query)).collect()
    }

    pub fn by_category(&self, category: &ProductCategory) -> Vec<Listing<'_>> {
        self.listings()
            .filter(|l| &l.product.category == category)
            .collect()
    }

    pub fn listing_count(&self) -> usize {
        self.entries.iter().map(|i| i.products.len()).sum()
    }

    pub fn verified_count(&self) -> usize {
        self.entries.iter().filter(|i| i.verified).count()
    }
}
