use anyhow::Result;

use crate::models::{Category, CreditCard, Id};

use super::Store;

/// Category whose name matches `name`, ignoring case and surrounding
/// whitespace. Names are unique per user under that comparison.
pub async fn find_category_by_name(
    store: &dyn Store,
    user: &Id,
    name: &str,
) -> Result<Option<Category>> {
    let categories = store.list_categories(user).await?;
    Ok(categories.into_iter().find(|c| c.name_matches(name)))
}

/// Card by id, falling back to a case-insensitive name match.
pub async fn find_card(
    store: &dyn Store,
    user: &Id,
    id_or_name: &str,
) -> Result<Option<CreditCard>> {
    let cards = store.list_cards(user).await?;
    if let Some(card) = cards.iter().find(|c| c.id.as_str() == id_or_name) {
        return Ok(Some(card.clone()));
    }

    let mut matches: Vec<CreditCard> = cards
        .into_iter()
        .filter(|c| c.name.eq_ignore_ascii_case(id_or_name))
        .collect();

    if matches.len() > 1 {
        let ids: Vec<String> = matches.iter().map(|c| c.id.to_string()).collect();
        anyhow::bail!("Multiple cards named '{id_or_name}'. Use an ID instead: {ids:?}");
    }

    Ok(matches.pop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardNetwork, NewCategory, NewCreditCard};
    use crate::storage::MemoryStore;

    fn card(name: &str) -> NewCreditCard {
        NewCreditCard {
            name: name.to_string(),
            last4: "1234".to_string(),
            network: CardNetwork::Visa,
            bg_image: None,
        }
    }

    #[tokio::test]
    async fn finds_category_ignoring_case() -> Result<()> {
        let store = MemoryStore::new();
        let user = Id::from_string("user-1");
        store
            .create_category(
                &user,
                &NewCategory {
                    name: "Transporte".to_string(),
                    icon: "directions_car".to_string(),
                    color: "#389ce0".to_string(),
                    subcategories: vec![],
                },
            )
            .await?;

        let found = find_category_by_name(&store, &user, " transporte ").await?;
        assert_eq!(found.map(|c| c.name), Some("Transporte".to_string()));
        assert!(find_category_by_name(&store, &user, "Ocio").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn ambiguous_card_names_are_an_error() -> Result<()> {
        let store = MemoryStore::new();
        let user = Id::from_string("user-1");
        let id = store.create_card(&user, &card("Viajes")).await?;
        store.create_card(&user, &card("viajes")).await?;

        assert!(find_card(&store, &user, "VIAJES").await.is_err());
        let by_id = find_card(&store, &user, id.as_str()).await?;
        assert_eq!(by_id.map(|c| c.id), Some(id));
        Ok(())
    }
}
