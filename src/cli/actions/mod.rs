pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        smtp_url: Option<String>,
        mail_from: String,
        require_activation: bool,
    },
}
