use contact_book_client::{ApiClient, ContactFilter, Settings, Store, utils};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load();

    let api = match ApiClient::http(&settings.base_url) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Cannot use {}: {}", settings.base_url, e);
            return ExitCode::FAILURE;
        }
    };
    let store = Store::new(api);
    let search = std::env::args().nth(1);

    let res = utils::block_on(async {
        store.init_store().await?;
        if let Some(search) = search {
            store.load_contacts(&ContactFilter::search(search)).await?;
        }
        Ok::<_, contact_book_client::Error>(())
    });
    if let Err(e) = res {
        let message = store.error().unwrap_or_else(|| e.to_string());
        eprintln!("Failed to initialize store: {}", message);
        return ExitCode::FAILURE;
    }

    let state = store.snapshot();
    println!("Groups ({})", state.groups.len());
    for group in &state.groups {
        let members = state.contacts_in_group(&group.id).len();
        println!(
            "  [{}] {} ({} members)",
            group.id,
            group.name().unwrap_or("-"),
            members
        );
    }

    println!("Contacts ({})", state.contacts.len());
    for contact in &state.contacts {
        let groups: Vec<&str> = contact
            .groups()
            .iter()
            .map(|g| g.name().unwrap_or("?"))
            .collect();
        let memberships = if groups.is_empty() {
            String::new()
        } else {
            format!(" <{}>", groups.join(", "))
        };
        println!("  [{}] {}{}", contact.id, contact.name().unwrap_or("-"), memberships);
    }
    if let Some(meta) = &state.pagination {
        println!("Pagination: {}", meta);
    }

    ExitCode::SUCCESS
}
