use once_cell::sync::Lazy;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

pub fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    RUNTIME.block_on(fut)
}

/// Turns user input like `localhost:8000` into `https://localhost:8000/api`.
pub fn normalize_base_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    if with_scheme.ends_with("/api") {
        with_scheme
    } else {
        format!("{}/api", with_scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_scheme_and_api_suffix() {
        assert_eq!(normalize_base_url("localhost:8000"), "https://localhost:8000/api");
        assert_eq!(
            normalize_base_url(" http://localhost:8000/api/ "),
            "http://localhost:8000/api"
        );
        assert_eq!(
            normalize_base_url("http://contacts.local/"),
            "http://contacts.local/api"
        );
    }
}
