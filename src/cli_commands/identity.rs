use clap::Args;

#[derive(Args)]
pub(crate) struct LoginArgs {
    /// Remote base URL, e.g. https://data.example.org
    #[arg(long)]
    pub(crate) url: String,
    #[arg(long = "api-key")]
    pub(crate) api_key: String,
}
