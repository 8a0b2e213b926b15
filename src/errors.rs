use std::fmt;

#[derive(Debug)]
pub enum ScrapeError {
    BrowserLaunch(String),
    PageCreation(String),
    Navigation(String),
    NavigationTimeout(String),
    EvaluationFailed(String),
    LoginFailed(String),
    ChallengeFailed(String),
    SelectorsExhausted,
    UnsupportedDomain(String),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScrapeError::BrowserLaunch(e) => write!(f, "Failed to launch browser: {}", e),
            ScrapeError::PageCreation(e) => write!(f, "Failed to create new page: {}", e),
            ScrapeError::Navigation(e) => write!(f, "Navigation failed: {}", e),
            ScrapeError::NavigationTimeout(url) => {
                write!(f, "Navigation to {} did not settle in time", url)
            }
            ScrapeError::EvaluationFailed(e) => write!(f, "JavaScript evaluation failed: {}", e),
            ScrapeError::LoginFailed(e) => write!(f, "Scripted login failed: {}", e),
            ScrapeError::ChallengeFailed(e) => write!(f, "Challenge page not passed: {}", e),
            ScrapeError::SelectorsExhausted => {
                write!(f, "All selector strategies produced no data")
            }
            ScrapeError::UnsupportedDomain(host) => {
                write!(f, "No platform handles the domain: {}", host)
            }
        }
    }
}

impl std::error::Error for ScrapeError {}
