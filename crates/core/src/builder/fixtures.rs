use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::builder::catalog::CatalogIndex;
use crate::domain::budget::Specification;
use crate::domain::client::ClientId;
use crate::domain::product::{Product, ProductId, ProductType};

pub(crate) fn product(
    id: &str,
    name: &str,
    kind: ProductType,
    category: &str,
    price: i64,
) -> Product {
    Product {
        id: ProductId(id.to_string()),
        name: name.to_string(),
        product_type: kind,
        category: category.to_string(),
        price: Decimal::new(price, 0),
    }
}

pub(crate) fn catalog_fixture() -> CatalogIndex {
    use ProductType::{Concrete, Other, Service};

    CatalogIndex::new(vec![
        product("c-conv-150", "Concreto Convencional f'c 150", Concrete, "Convencional", 1650),
        product("c-conv-200", "Concreto Convencional f'c 200", Concrete, "Convencional", 1750),
        product("c-conv-250", "Concreto Convencional f'c 250", Concrete, "Convencional", 1850),
        product("c-bomb-200", "Concreto Bombeable f'c 200", Concrete, "Bombeable", 1950),
        product("c-bomb-250", "Concreto Bombeable f'c 250", Concrete, "Bombeable", 2050),
        product("c-pav-40", "Concreto Pavimento MR 40", Concrete, "Pavimento", 2300),
        product("c-pav-45", "Concreto vial 45 kg", Concrete, "Pavimento", 2400),
        product(
            "c-rr-300",
            "Concreto Rápida Resistencia f'c 300",
            Concrete,
            "Rapida Resistencia",
            2500,
        ),
        product("srv-bombeo", "Servicio de Bombeo", Service, "Servicios", 350),
        product("oth-fibra", "Fibra de polipropileno", Other, "Aditivos", 120),
        product("oth-aditivo", "Aditivo para concreto", Other, "Aditivos", 90),
    ])
}

pub(crate) fn monday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .expect("valid fixture instant")
}

pub(crate) fn specification_fixture() -> Specification {
    Specification {
        client_id: Some(ClientId("cli-001".to_string())),
        title: "Losa casa habitación".to_string(),
        address: "Av. Juárez 120".to_string(),
        delivery_date: NaiveDate::from_ymd_opt(2024, 1, 10),
        work_type: "vivienda".to_string(),
        concrete_category: "Convencional".to_string(),
        resistance: "150".to_string(),
        volume: None,
        pump_required: false,
        observations: String::new(),
        valid_until: NaiveDate::from_ymd_opt(2024, 1, 9).expect("valid fixture date"),
    }
}
