use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use fincabot_core::ListingMatch;
use fincabot_llm::ResponseGenerator;
use fincabot_store::ListingStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// How many matches a chat turn retrieves, and how many cards it shows.
const CHAT_TOP_K: usize = 5;
const CHAT_CARDS: usize = 3;

const SEARCH_DEFAULT_LIMIT: usize = 5;
const SEARCH_MAX_LIMIT: usize = 50;

const NO_MATCHES_REPLY: &str = "I couldn't find any properties matching your requirements. \
     Please try different criteria, or ask for /help for guidance.";

const GENERATOR_DOWN_REPLY: &str = "I found some promising properties but couldn't write a \
     summary right now. Here are the closest matches:";

const HELP_TEXT: &str = "🏠 Property Search Help\n\n\
     Ask about properties in natural language. Include details like:\n\
     - Location preferences\n\
     - Price range\n\
     - Number of bedrooms/bathrooms\n\
     - Property type (apartment, villa, etc.)\n\
     - Special features (pool, garage, etc.)\n\n\
     Example queries:\n\
     1. \"Find me a 2-bedroom apartment in Guardamar under 200,000 euros\"\n\
     2. \"Show villas with pools in Torrevieja\"\n\
     3. \"I need a property near the beach with at least 3 bedrooms\"\n\n\
     Tips: be specific about your requirements; you can mention multiple criteria.";

/// Everything a request handler needs, built once at startup and shared by
/// handle - no global mutable state.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn ListingStore>,
    pub generator: Option<Arc<dyn ResponseGenerator>>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    listings: Vec<ListingCard>,
}

#[derive(Serialize)]
struct ListingCard {
    id: String,
    score: f32,
    card: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResult {
    id: String,
    score: f32,
    card: String,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(context: AppContext, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(context.clone()))
                .route("/health", web::get().to(health))
                .route("/help", web::get().to(help))
                .route("/search", web::post().to(search))
                .route("/chat", web::post().to(chat))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

async fn health(context: web::Data<AppContext>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "documents": context.store.len(),
        "model": context.store.model_name(),
    })))
}

async fn help() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "help": HELP_TEXT })))
}

async fn search(
    context: web::Data<AppContext>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let query = req.query.trim();
    if query.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "query must not be empty"
        })));
    }

    let limit = req
        .limit
        .unwrap_or(SEARCH_DEFAULT_LIMIT)
        .min(SEARCH_MAX_LIMIT);
    let results: Vec<SearchResult> = context
        .store
        .search(query, limit)
        .into_iter()
        .map(|m| SearchResult {
            id: m.listing.id.clone(),
            score: m.score,
            card: m.listing.to_display_text(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(results))
}

async fn chat(
    context: web::Data<AppContext>,
    req: web::Json<ChatRequest>,
) -> ActixResult<HttpResponse> {
    let message = req.message.trim();
    if message.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "message must not be empty"
        })));
    }

    let matches = context.store.search(message, CHAT_TOP_K);
    if matches.is_empty() {
        return Ok(HttpResponse::Ok().json(ChatResponse {
            reply: NO_MATCHES_REPLY.to_string(),
            listings: Vec::new(),
        }));
    }

    // A generator failure degrades to cards with a stock reply; a single
    // bad request must never take the serving loop down.
    let reply = match &context.generator {
        Some(generator) => match generator.generate(message, &matches).await {
            Ok(text) => text,
            Err(e) => {
                error!("Response generation failed: {e}");
                GENERATOR_DOWN_REPLY.to_string()
            }
        },
        None => format!("Here are the closest matches I found for \"{message}\":"),
    };

    Ok(HttpResponse::Ok().json(ChatResponse {
        reply,
        listings: cards(&matches),
    }))
}

fn cards(matches: &[ListingMatch]) -> Vec<ListingCard> {
    matches
        .iter()
        .take(CHAT_CARDS)
        .map(|m| ListingCard {
            id: m.listing.id.clone(),
            score: m.score,
            card: m.listing.to_display_text(),
        })
        .collect()
}
