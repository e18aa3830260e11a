//! Browser fingerprint material: a pool of realistic desktop user agents,
//! anti-automation launch flags, and an init script that patches the
//! signals headless Chromium leaks.

use rand::Rng;

/// Realistic desktop user agents, rotated per session.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Chromium launch flags that suppress the obvious automation markers.
pub const LAUNCH_FLAGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-web-security",
];

/// Patches `navigator.webdriver`, `chrome.runtime`, plugins, and languages
/// so the page scripts see an ordinary browser.
pub const STEALTH_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false,
        configurable: true,
    });

    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: function() {},
            sendMessage: function() {},
        };
    }

    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5],
        configurable: true,
    });

    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true,
    });
})();
"#;

/// Uniform pick from the user-agent pool.
pub fn select_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_select_covers_pool() {
        let mut rng = StdRng::seed_from_u64(2);
        let picked: HashSet<_> = (0..1_000).map(|_| select_user_agent(&mut rng)).collect();
        assert_eq!(picked.len(), USER_AGENTS.len());
        for ua in picked {
            assert!(USER_AGENTS.contains(&ua));
        }
    }
}
