//! Askama templates and the UI primitives they render

use askama::Template;
use mobileorder_database::{Item, Shop};

// ============================================================================
// Primitives
// ============================================================================

/// Visual style of a [`Button`]
///
/// Pages currently only use `Default` and `Outline`.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonVariant {
    #[default]
    Default,
    Outline,
    Secondary,
    Ghost,
    Destructive,
    Link,
}

impl ButtonVariant {
    /// Value of the `data-variant` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Outline => "outline",
            Self::Secondary => "secondary",
            Self::Ghost => "ghost",
            Self::Destructive => "destructive",
            Self::Link => "link",
        }
    }

    /// CSS classes for the variant
    pub fn classes(&self) -> &'static str {
        match self {
            Self::Default => "btn btn-default",
            Self::Outline => "btn btn-outline",
            Self::Secondary => "btn btn-secondary",
            Self::Ghost => "btn btn-ghost",
            Self::Destructive => "btn btn-destructive",
            Self::Link => "btn btn-link",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub variant: ButtonVariant,
    pub disabled: bool,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            variant: ButtonVariant::default(),
            disabled: false,
        }
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Card with header, content and footer regions
///
/// Regions left empty are not rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub action: Option<Button>,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            content: None,
            action: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn action(mut self, button: Button) -> Self {
        self.action = Some(button);
        self
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Landing page
#[derive(Template)]
#[template(path = "pages/menu.html")]
pub struct MenuTemplate {
    pub heading: String,
    pub cards: Vec<Card>,
}

impl MenuTemplate {
    /// The fixed landing page content
    pub fn home() -> Self {
        let card = Card::new("たこ焼き")
            .description("おいしいです")
            .content("This is some content inside the card.")
            .action(Button::new("Action").variant(ButtonVariant::Outline));

        Self {
            heading: "メニュー".to_string(),
            cards: vec![card.clone(), card],
        }
    }
}

/// A shop's menu built from its items
#[derive(Template)]
#[template(path = "pages/shop_menu.html")]
pub struct ShopMenuTemplate {
    pub shop: Shop,
    pub cards: Vec<Card>,
}

impl ShopMenuTemplate {
    pub fn new(shop: Shop, items: &[Item]) -> Self {
        let cards = items.iter().map(item_card).collect();
        Self { shop, cards }
    }
}

fn item_card(item: &Item) -> Card {
    let button = if item.is_available {
        Button::new("注文する")
    } else {
        Button::new("売り切れ").disabled(true)
    };

    let card = Card::new(&item.item_name)
        .description(item.price_label())
        .action(button.variant(ButtonVariant::Outline));

    match &item.description {
        Some(description) => card.content(description),
        None => card,
    }
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_page_structure() {
        let html = MenuTemplate::home().render().unwrap();

        assert_eq!(html.matches("<h1").count(), 1);
        assert!(html.contains(">メニュー</h1>"));
        assert_eq!(html.matches(r#"data-slot="card""#).count(), 2);
        assert_eq!(html.matches(">たこ焼き<").count(), 2);
        assert_eq!(html.matches(">おいしいです<").count(), 2);
        assert_eq!(html.matches("This is some content inside the card.").count(), 2);
        assert_eq!(html.matches(r#"data-slot="button""#).count(), 2);
        assert_eq!(html.matches(r#"data-variant="outline""#).count(), 2);
        assert_eq!(html.matches(">Action</button>").count(), 2);
        assert!(html.contains(r#"class="min-h-screen p-8""#));
        assert!(html.contains(r#"class="mt-8 space-y-4""#));
    }

    #[test]
    fn test_card_regions_are_marked() {
        let html = MenuTemplate::home().render().unwrap();
        for slot in [
            "card-header",
            "card-title",
            "card-description",
            "card-content",
            "card-footer",
            "card-action",
        ] {
            assert_eq!(html.matches(&format!(r#"data-slot="{}""#, slot)).count(), 2, "{}", slot);
        }
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let first = MenuTemplate::home().render().unwrap();
        let second = MenuTemplate::home().render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shop_menu_cards() {
        let shop = Shop {
            shop_id: 1,
            name: "Shop A".to_string(),
            location: Some("Location A".to_string()),
        };
        let items = vec![
            Item {
                item_id: 1,
                item_name: "たこ焼き".to_string(),
                description: Some("8個入り".to_string()),
                price: 500.0,
                is_available: true,
            },
            Item {
                item_id: 2,
                item_name: "焼きそば".to_string(),
                description: None,
                price: 600.0,
                is_available: false,
            },
        ];

        let html = ShopMenuTemplate::new(shop, &items).render().unwrap();
        assert_eq!(html.matches(r#"data-slot="card""#).count(), 2);
        assert!(html.contains("¥500"));
        assert!(html.contains("8個入り"));
        assert_eq!(html.matches(r#"data-slot="card-content""#).count(), 1);
        assert_eq!(html.matches(" disabled>").count(), 1);
        assert!(html.contains("Location A"));
    }

    #[test]
    fn test_empty_shop_menu() {
        let shop = Shop {
            shop_id: 1,
            name: "Shop A".to_string(),
            location: None,
        };
        let html = ShopMenuTemplate::new(shop, &[]).render().unwrap();
        assert!(html.contains("商品がありません。"));
    }

    #[test]
    fn test_every_variant_renders() {
        let variants = [
            ButtonVariant::Default,
            ButtonVariant::Outline,
            ButtonVariant::Secondary,
            ButtonVariant::Ghost,
            ButtonVariant::Destructive,
            ButtonVariant::Link,
        ];
        let template = MenuTemplate {
            heading: "ボタン".to_string(),
            cards: variants
                .iter()
                .map(|&variant| Card::new("たこ焼き").action(Button::new("Action").variant(variant)))
                .collect(),
        };

        let html = template.render().unwrap();
        for variant in variants {
            let attrs = format!(
                r#"data-variant="{}" class="{}""#,
                variant.as_str(),
                variant.classes()
            );
            assert_eq!(html.matches(&attrs).count(), 1, "{}", variant.as_str());
        }
    }

    #[test]
    fn test_button_variants() {
        assert_eq!(ButtonVariant::default().as_str(), "default");
        assert_eq!(ButtonVariant::Destructive.as_str(), "destructive");
        assert!(ButtonVariant::Ghost.classes().contains("btn-ghost"));
    }
}
