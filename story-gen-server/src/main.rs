use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use clap::Parser;
use log::{error, info, warn};
use serde::Deserialize;

use story_gen_core::io::{list_models, load_model, model_path};
use story_gen_core::{ModelStats, NGramModel};

/// HTTP front-end serving drafts from persisted n-gram models.
#[derive(Parser)]
struct Args {
	/// Directory holding `*.bin` model files
	#[arg(long, default_value = "models")]
	models: PathBuf,
	#[arg(long, default_value = "127.0.0.1")]
	bind: String,
	#[arg(long, default_value_t = 5000)]
	port: u16,
}

/// Query parameters of the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	model: String,
	prefix: Option<String>,
	num_sentences: Option<usize>,
	max_tokens: Option<usize>,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
}

/// Loaded models, keyed by name (file stem).
///
/// Generation only reads the models; the lock is taken for writing
/// when the set of loaded models is replaced.
struct SharedData {
	folder: PathBuf,
	models: RwLock<BTreeMap<String, NGramModel>>,
}

/// Whether `name` can only designate a model file directly inside the folder.
fn is_plain_name(name: &str) -> bool {
	!name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Loads every model file of `folder`, skipping (with a warning) unreadable ones.
fn load_available(folder: &Path) -> BTreeMap<String, NGramModel> {
	let names = list_models(folder).unwrap_or_else(|e| {
		warn!("no models loaded from {}: {e}", folder.display());
		Vec::new()
	});

	let mut models = BTreeMap::new();
	for name in names {
		match load_model(model_path(folder, &name)) {
			Ok(model) => {
				models.insert(name, model);
			}
			Err(e) => warn!("skipping {name}: {e}"),
		}
	}
	models
}

/// Loads the named models from `folder`, failing on the first unreadable one.
fn load_named(folder: &Path, names: &[&str]) -> Result<BTreeMap<String, NGramModel>, String> {
	let mut models = BTreeMap::new();
	for name in names {
		let model = load_model(model_path(folder, name)).map_err(|e| format!("Failed to load model {name}: {e}"))?;
		models.insert((*name).to_owned(), model);
	}
	Ok(models)
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a draft with the requested model and returns it as plain text.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let prefix = query.prefix.as_deref().unwrap_or("");
	let num_sentences = query.num_sentences.unwrap_or(3);
	let max_tokens = query.max_tokens.unwrap_or(80);

	let models = match data.models.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match models.get(&query.model) {
		Some(model) => HttpResponse::Ok().body(model.generate_multi(prefix, num_sentences, max_tokens)),
		None => HttpResponse::NotFound().body(format!("Model {} is not loaded", query.model)),
	}
}

/// Lists the model files available on disk.
#[get("/v1/models")]
async fn get_models(data: web::Data<SharedData>) -> impl Responder {
	match list_models(&data.folder) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(e) => {
			error!("failed to list models: {e}");
			HttpResponse::InternalServerError().body("Failed to list models")
		}
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<SharedData>) -> impl Responder {
	let models = match data.models.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let names: Vec<&str> = models.keys().map(String::as_str).collect();
	HttpResponse::Ok().body(names.join("\n"))
}

/// Statistics of every loaded model, as JSON keyed by model name.
#[get("/v1/stats")]
async fn get_stats(data: web::Data<SharedData>) -> impl Responder {
	let models = match data.models.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let stats: BTreeMap<&str, ModelStats> = models.iter().map(|(name, model)| (name.as_str(), model.stats())).collect();
	HttpResponse::Ok().json(stats)
}

/// Replaces the loaded models with the comma-separated `names`.
///
/// Names must be plain file stems (no path separators, `.` or `..`).
/// Nothing is replaced if any of the models fails to load.
#[put("/v1/load_models")]
async fn put_models(data: web::Data<SharedData>, query: web::Query<ModelQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();

	if model_names.is_empty() {
		return HttpResponse::BadRequest().body("Missing or empty model name");
	}
	if let Some(name) = model_names.iter().find(|name| !is_plain_name(name)) {
		return HttpResponse::BadRequest().body(format!("Invalid model name {name}"));
	}

	let loaded = match load_named(&data.folder, &model_names) {
		Ok(loaded) => loaded,
		Err(e) => {
			warn!("{e}");
			return HttpResponse::NotFound().body(e);
		}
	};

	let mut models = match data.models.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	*models = loaded;
	info!("loaded models: {}", model_names.join(", "));

	HttpResponse::Ok().body("Models loaded successfully")
}

/// Main entry point for the server.
///
/// Loads every readable model found in the model folder (if it exists), then
/// starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let args = Args::parse();

	let models = load_available(&args.models);
	info!("serving {} models from {}", models.len(), args.models.display());

	let shared_data = web::Data::new(SharedData {
		folder: args.models.clone(),
		models: RwLock::new(models),
	});

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_models)
			.service(get_loaded_models)
			.service(get_stats)
			.service(put_models)
	})
		.bind((args.bind.as_str(), args.port))?
		.run()
		.await
}
