//! Minimal in-memory API navigated with the HAL client.
//!
//! This example demonstrates how to implement the `Fetcher` trait for a
//! canned set of responses and walk links, CURIEs and collections.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use hal_client::{
    ClientConfig, ClientContext, EntryPoint, Fetcher, HalError, HalResult, Templated, Variables,
};
use http::{Request, Response};

/// Serves fixed HAL documents keyed by URI.
struct MockApi {
    documents: HashMap<&'static str, &'static str>,
    hits: Cell<u32>,
}

impl MockApi {
    fn new() -> Self {
        let mut documents = HashMap::new();
        documents.insert(
            "http://shop.local/",
            r#"{
                "name": "Mock Shop",
                "_links": {
                    "self": {"href": "http://shop.local/"},
                    "curies": [{"name": "shop", "href": "http://shop.local/docs/{rel}", "templated": true}],
                    "shop:orders": {"href": "http://shop.local/orders", "title": "Recent orders"},
                    "shop:order": {"href": "http://shop.local/orders/{id}", "templated": true}
                }
            }"#,
        );
        documents.insert(
            "http://shop.local/orders",
            r#"{
                "total": 2,
                "_embedded": {
                    "orders": [
                        {"id": 1, "status": "shipped", "amount": 30.0},
                        {"id": 2, "status": "processing", "amount": 12.5}
                    ]
                }
            }"#,
        );
        documents.insert(
            "http://shop.local/orders/2",
            r#"{"id": 2, "status": "processing", "amount": 12.5}"#,
        );

        Self {
            documents,
            hits: Cell::new(0),
        }
    }
}

#[async_trait(?Send)]
impl Fetcher for MockApi {
    async fn send_request(&self, request: Request<()>) -> HalResult<Response<Vec<u8>>> {
        self.hits.set(self.hits.get() + 1);
        let uri = request.uri().to_string();

        let Some(body) = self.documents.get(uri.as_str()) else {
            return Response::builder()
                .status(404)
                .body(Vec::new())
                .map_err(|e| HalError::Transport(e.to_string()));
        };

        Response::builder()
            .status(200)
            .header("content-type", "application/hal+json")
            .body(body.as_bytes().to_vec())
            .map_err(|e| HalError::Transport(e.to_string()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api = Rc::new(MockApi::new());
    let config = ClientConfig::new().with_header("Accept", "application/hal+json");
    let context = ClientContext::from_config(api.clone(), &config)?;

    let entry = EntryPoint::new("http://shop.local/", context);
    let root = entry.resource().await?;

    println!("API:     {:?}", root.property("name"));
    println!("Links:   {:?}", root.link_names());
    println!();

    // CURIE documentation
    if let Some(orders) = root.link("shop:orders")? {
        println!("Orders:  {} ({})", orders.href(), orders.title().unwrap_or("-"));
        println!("Docs:    {}", orders.docs().unwrap_or_default());
    }

    // Follow a link; the embedded collection is materialised lazily
    let page = entry
        .get("shop:orders")
        .await?
        .and_then(|r| r.into_resource())
        .ok_or("orders link missing")?;
    let collection = page
        .get("orders")
        .await?
        .and_then(|r| r.into_collection())
        .ok_or("orders collection missing")?;

    println!("Count:   {}", collection.count()?);
    for order in collection.iter() {
        let Some(order) = order? else { continue };
        println!(
            "  #{} {} {}",
            order.property("id").unwrap_or_default(),
            order.property("status").unwrap_or_default(),
            order.property("amount").unwrap_or_default()
        );
    }
    println!();

    // Templated link
    if let Some(template) = root.link("shop:order")? {
        let order = template.get(&Variables::new().with("id", 2)).await?;
        println!("Order 2: {:?}", order.property("status"));
    }

    // Second access is served from cache
    entry.get("shop:orders").await?;
    println!("\nRequests sent: {}", api.hits.get());

    Ok(())
}
