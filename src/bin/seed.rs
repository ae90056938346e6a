//! Vacía el catálogo y lo llena con datos de ejemplo.
//!
//! ```sh
//! SEED_ADMIN_USERNAME=admin SEED_ADMIN_PASSWORD=changeme cargo run --bin softcat-seed
//! ```

use std::collections::HashMap;

use softcat::{
    config::Config,
    db,
    models::{
        category::CategoryRecord,
        software::{License, Os, SoftwareRecord},
    },
    store::{CatalogStore, PgStore},
    utils::{security::hash_password, slug::slugify},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// (nombre, descripción, icono)
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Development Tools", "IDEs, code editors, and development environments for programmers", "fa-code"),
    ("Security & Privacy", "Antivirus, firewall, and privacy protection software", "fa-shield-alt"),
    ("System Utilities", "System optimization, cleanup, and maintenance tools", "fa-tools"),
    ("Multimedia", "Audio, video, and image editing software", "fa-photo-video"),
    ("Productivity", "Office suites, note-taking, and task management applications", "fa-tasks"),
    ("Communication", "Email clients, messaging, and video conferencing tools", "fa-comments"),
    ("Education", "Learning software, educational tools, and reference materials", "fa-graduation-cap"),
    ("Gaming", "Game development tools, gaming utilities, and game mods", "fa-gamepad"),
];

struct SampleSoftware {
    name: &'static str,
    description: &'static str,
    version: &'static str,
    size: &'static str,
    os: &'static [Os],
    license: License,
    rating: f64,
    downloads: i64,
    file: &'static str,
    category: &'static str,
}

const SOFTWARE: &[SampleSoftware] = &[
    SampleSoftware {
        name: "Visual Studio Code",
        description: "A lightweight but powerful source code editor with built-in support for JavaScript, TypeScript and Node.js",
        version: "1.85.1",
        size: "100MB",
        os: &[Os::Windows, Os::MacOs, Os::Linux],
        license: License::Free,
        rating: 4.8,
        downloads: 1_500_000,
        file: "vscode-1.85.1.zip",
        category: "Development Tools",
    },
    SampleSoftware {
        name: "Sublime Text 4",
        description: "A sophisticated text editor for code, markup and prose",
        version: "4.0",
        size: "30MB",
        os: &[Os::Windows, Os::MacOs, Os::Linux],
        license: License::Paid,
        rating: 4.7,
        downloads: 800_000,
        file: "sublime-text-4.zip",
        category: "Development Tools",
    },
    SampleSoftware {
        name: "Malwarebytes Premium",
        description: "Real-time protection against malware, ransomware and malicious websites",
        version: "4.6.0",
        size: "250MB",
        os: &[Os::Windows, Os::MacOs],
        license: License::Trial,
        rating: 4.6,
        downloads: 950_000,
        file: "malwarebytes-4.6.0.exe",
        category: "Security & Privacy",
    },
    SampleSoftware {
        name: "CCleaner Professional",
        description: "Cleans junk files and keeps the system running fast",
        version: "6.2.0",
        size: "50MB",
        os: &[Os::Windows, Os::MacOs],
        license: License::Trial,
        rating: 4.4,
        downloads: 1_200_000,
        file: "ccleaner-6.2.0.exe",
        category: "System Utilities",
    },
    SampleSoftware {
        name: "DaVinci Resolve",
        description: "Editing, color correction, visual effects and audio post production in one tool",
        version: "18.5",
        size: "3GB",
        os: &[Os::Windows, Os::MacOs, Os::Linux],
        license: License::Free,
        rating: 4.8,
        downloads: 450_000,
        file: "davinci-resolve-18.5.zip",
        category: "Multimedia",
    },
    SampleSoftware {
        name: "LibreOffice",
        description: "Free and open source office suite with a word processor, spreadsheets and presentations",
        version: "7.6.4",
        size: "350MB",
        os: &[Os::Windows, Os::MacOs, Os::Linux],
        license: License::OpenSource,
        rating: 4.4,
        downloads: 1_100_000,
        file: "libreoffice-7.6.4.zip",
        category: "Productivity",
    },
    SampleSoftware {
        name: "Zoom Client",
        description: "Video meetings, chat and webinars",
        version: "5.15.5",
        size: "80MB",
        os: &[Os::Windows, Os::MacOs, Os::Linux],
        license: License::Free,
        rating: 4.5,
        downloads: 3_000_000,
        file: "zoom-5.15.5.exe",
        category: "Communication",
    },
    SampleSoftware {
        name: "Anki",
        description: "Flashcards with spaced repetition for learning anything",
        version: "23.12",
        size: "120MB",
        os: &[Os::Windows, Os::MacOs, Os::Linux],
        license: License::OpenSource,
        rating: 4.7,
        downloads: 350_000,
        file: "anki-23.12.zip",
        category: "Education",
    },
    SampleSoftware {
        name: "Unity Hub",
        description: "Manage Unity editor installs and game projects",
        version: "3.5.0",
        size: "150MB",
        os: &[Os::Windows, Os::MacOs, Os::Linux],
        license: License::Free,
        rating: 4.5,
        downloads: 400_000,
        file: "unity-hub-3.5.0.exe",
        category: "Gaming",
    },
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Seed fallido: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let store = PgStore::new(db::init_db(&config).await?);
    store.migrate().await?;

    // 1. Vaciar todo
    store.clear().await?;
    tracing::info!("Catálogo vaciado");

    // 2. Categorías
    let mut ids = HashMap::new();
    for (name, description, icon) in CATEGORIES {
        let category = store
            .insert_category(&CategoryRecord {
                name: name.to_string(),
                description: description.to_string(),
                icon: icon.to_string(),
                slug: slugify(name),
            })
            .await?;
        ids.insert(*name, category.id);
    }
    tracing::info!(count = ids.len(), "Categorías creadas");

    // 3. Software
    for sample in SOFTWARE {
        let category_id = *ids
            .get(sample.category)
            .ok_or_else(|| format!("unknown seed category {}", sample.category))?;
        store
            .insert_software(&SoftwareRecord {
                name: sample.name.to_string(),
                description: sample.description.to_string(),
                file_url: format!("https://example.com/downloads/{}", sample.file),
                category_id,
                version: sample.version.to_string(),
                size: sample.size.to_string(),
                os: sample.os.to_vec(),
                license: sample.license,
                thumbnail: format!("https://picsum.photos/seed/{}/300/200", slugify(sample.name)),
                rating: sample.rating,
                downloads: sample.downloads,
            })
            .await?;
    }
    tracing::info!(count = SOFTWARE.len(), "Software creado");

    // 4. Admin
    match (
        std::env::var("SEED_ADMIN_USERNAME"),
        std::env::var("SEED_ADMIN_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) if !password.is_empty() => {
            let hash = hash_password(&password)?;
            store.insert_admin(&username, &hash).await?;
            tracing::info!(%username, "Admin creado");
        }
        _ => tracing::warn!("SEED_ADMIN_USERNAME/SEED_ADMIN_PASSWORD no definidos, no se crea admin"),
    }

    store.close().await;
    Ok(())
}
