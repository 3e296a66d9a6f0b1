//! Album catalogue served through the MVC lifecycle.
//!
//! ```text
//! cargo run --example album
//! curl localhost:3000/album/index
//! curl -H 'accept: application/json' localhost:3000/album/index
//! curl -X POST -d 'title=Blue&artist=Joni' localhost:3000/api/albums
//! curl localhost:3000/api/albums/1
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagehand::prelude::*;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Album {
    id: u64,
    title: String,
    artist: String,
}

#[derive(Default)]
struct AlbumTable {
    albums: Mutex<Vec<Album>>,
}

impl AlbumTable {
    fn seeded() -> Self {
        let table = Self::default();
        table.insert("Kind of Blue", "Miles Davis");
        table.insert("Blue Train", "John Coltrane");
        table
    }

    fn insert(&self, title: &str, artist: &str) -> Album {
        let mut albums = self.albums.lock().unwrap_or_else(|e| e.into_inner());
        let album = Album {
            id: albums.len() as u64 + 1,
            title: title.to_string(),
            artist: artist.to_string(),
        };
        albums.push(album.clone());
        album
    }

    fn all(&self) -> Vec<Album> {
        self.albums.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn find(&self, id: &str) -> Option<Album> {
        let id: u64 = id.parse().ok()?;
        self.all().into_iter().find(|a| a.id == id)
    }
}

fn album_controller(table: Arc<AlbumTable>) -> ActionController {
    let selector = AcceptableViewModelSelector::default();

    ActionController::new()
        .action("index", move |event| {
            let albums = table.all();
            let mut model = event.acceptable_view_model(&selector);
            if model.kind() == ModelKind::Json {
                return Ok(model.with_variable("albums", serde_json::to_value(&albums)?).into());
            }

            let list: String = albums
                .iter()
                .map(|a| format!("<li>{} by {}</li>", a.title, a.artist))
                .collect();
            model.set_template("album/index");
            Ok(model.with_variable("albums", list).into())
        })
        .action("latest", |event| {
            Ok(event.redirect().to_route(Some("album"), &[("action", "index")])?)
        })
}

struct AlbumResource {
    table: Arc<AlbumTable>,
}

impl RestfulResource for AlbumResource {
    fn get(&mut self, event: &mut MvcEvent, id: &str) -> anyhow::Result<ActionResult> {
        match self.table.find(id) {
            Some(album) => Ok(ViewModel::json()
                .with_variable("album", serde_json::to_value(album)?)
                .into()),
            None => {
                *event.response_mut().status_mut() = axum::http::StatusCode::NOT_FOUND;
                Ok(ViewModel::json().with_variable("error", "no such album").into())
            }
        }
    }

    fn get_list(&mut self, _event: &mut MvcEvent) -> anyhow::Result<ActionResult> {
        Ok(ViewModel::json()
            .with_variable("albums", serde_json::to_value(self.table.all())?)
            .into())
    }

    fn create(&mut self, event: &mut MvcEvent, data: Value) -> anyhow::Result<ActionResult> {
        let field = |name: &str| data.get(name).and_then(Value::as_str).unwrap_or("").to_string();
        let album = self.table.insert(&field("title"), &field("artist"));
        tracing::info!("Created album {} ({})", album.id, album.title);

        *event.response_mut().status_mut() = axum::http::StatusCode::CREATED;
        Ok(ViewModel::json()
            .with_variable("album", serde_json::to_value(album)?)
            .into())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let table = Arc::new(AlbumTable::seeded());

    let mut router = HttpRouter::new();
    router.add_route("album", "/album/{action}", &[("controller", "album")])?;
    router.add_route("albums", "/api/albums", &[("controller", "albums")])?;
    router.add_route("albums/id", "/api/albums/{id}", &[("controller", "albums")])?;

    let config = ApplicationConfig {
        display_not_found_reason: true,
        ..ApplicationConfig::default()
    };
    let renderer: Arc<dyn Renderer> = Arc::new(
        TemplateMapRenderer::with_defaults(
            &config.layout_template,
            &config.not_found_template,
            &config.exception_template,
        )
        .with_template("album/index", "<h1>Albums</h1>\n<ul>{{ albums }}</ul>"),
    );

    let albums = Arc::clone(&table);
    let resources = Arc::clone(&table);
    let app = Application::builder()
        .config(config)
        .service(keys::VIEW_RENDERER, renderer)
        .router(router)
        .controller("album", move |_| Ok(album_controller(Arc::clone(&albums))))
        .controller("albums", move |_| {
            Ok(RestfulController::new(AlbumResource {
                table: Arc::clone(&resources),
            }))
        })
        .init()?;

    stagehand::server::serve(Arc::new(app), "127.0.0.1:3000").await?;
    Ok(())
}
