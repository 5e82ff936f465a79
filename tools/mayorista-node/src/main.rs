//! `mayorista`: command-line client for the wholesale marketplace.
//!
//! Every invocation loads the shared partitions from `--data-dir`, resumes the
//! session saved by the previous invocation, runs one request and prints the
//! response as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Weekday;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mayorista_common::catalog::CatalogFilter;
use mayorista_common::coverage::HourRange;
use mayorista_common::currency::parse_pesos;
use mayorista_common::export::export_file_name;
use mayorista_common::geography::parse_day;
use mayorista_common::identity::{RegistrationForm, UserId, UserRole};
use mayorista_common::import::Row;
use mayorista_common::order::{OrderId, OrderStatus};
use mayorista_common::product::{ConservationType, ProductDraft, ProductId};
use mayorista_delegate::{parse_request, response_json, MarketDelegate, MarketRequest, MarketResponse};
use mayorista_node::settings::{default_data_dir, load_config, load_session, save_session};
use mayorista_node::JsonFileStore;

#[derive(Parser)]
#[command(name = "mayorista", about = "Wholesale B2B marketplace client")]
struct Cli {
    /// Directory holding the shared partitions and the session file.
    #[arg(long, env = "MAYORISTA_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Marketplace config (default: <data-dir>/config.json).
    #[arg(long, env = "MAYORISTA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and log in.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum)]
        role: Role,
        #[arg(long)]
        business: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        locality: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum)]
        role: Role,
    },
    Logout,
    Whoami,
    /// Browse the catalog, grouped by product.
    Catalog(CatalogArgs),
    Brands,
    Suppliers,
    #[command(subcommand)]
    Cart(CartCommand),
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// Notifications for the current user.
    Notifications {
        /// Only print the unread count.
        #[arg(long)]
        unread: bool,
    },
    #[command(subcommand)]
    Messages(MessagesCommand),
    #[command(subcommand)]
    Products(ProductsCommand),
    #[command(subcommand)]
    Coverage(CoverageCommand),
    /// Dispatch a raw JSON request.
    Request { json: String },
}

#[derive(Args)]
struct CatalogArgs {
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, value_enum)]
    conservation: Option<Conservation>,
    /// Minimum price in pesos.
    #[arg(long, value_parser = pesos)]
    min_price: Option<u64>,
    /// Maximum price in pesos.
    #[arg(long, value_parser = pesos)]
    max_price: Option<u64>,
    #[arg(long)]
    on_sale: bool,
    #[arg(long)]
    in_stock: bool,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long, requires = "department")]
    locality: Option<String>,
}

#[derive(Subcommand)]
enum CartCommand {
    Show,
    Add { product: String },
    /// Change a line's quantity by a signed amount.
    Qty {
        product: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    Remove { product: String },
    /// Drop one supplier's lines.
    Clear { supplier: String },
    Confirm,
}

#[derive(Subcommand)]
enum OrdersCommand {
    List,
    Open { order: String },
    Advance {
        order: String,
        #[arg(value_enum)]
        status: Status,
    },
    /// Print an order's lines; with --out, also write them to a file.
    Export {
        order: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Summary,
}

#[derive(Subcommand)]
enum MessagesCommand {
    Send { to: String, text: String },
    /// Mark a sender's messages as read.
    Read { from: String },
    /// Open the thread with another user.
    Show { with: String },
    List {
        #[arg(long)]
        unread: bool,
    },
}

#[derive(Subcommand)]
enum ProductsCommand {
    List,
    Save(ProductArgs),
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Import products from a JSON array of spreadsheet rows.
    Import { file: PathBuf },
    LowStock,
}

#[derive(Args)]
struct ProductArgs {
    /// Existing product id to update.
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    /// Price in pesos.
    #[arg(long, value_parser = pesos)]
    price: Option<u64>,
    #[arg(long, value_parser = pesos)]
    old_price: Option<u64>,
    #[arg(long, value_enum)]
    conservation: Option<Conservation>,
    #[arg(long)]
    unit: Option<String>,
    #[arg(long)]
    stock: Option<u32>,
    #[arg(long)]
    min_stock: Option<u32>,
    /// Mark (true) or unmark (false) the product as on sale.
    #[arg(long)]
    on_sale: Option<bool>,
}

#[derive(Subcommand)]
enum CoverageCommand {
    Show,
    Toggle { department: String, locality: String },
    /// Set delivery hours, e.g. "08:00 - 18:00".
    Hours {
        department: String,
        locality: String,
        hours: HourRange,
    },
    /// Toggle a delivery day (Spanish name, e.g. "Miércoles").
    Day {
        department: String,
        locality: String,
        #[arg(value_parser = weekday)]
        day: Weekday,
    },
    /// Copy a locality's schedule to its whole department.
    Apply { department: String, locality: String },
    /// Minimum order in pesos; omit to use the marketplace default.
    MinOrder {
        #[arg(value_parser = pesos)]
        value: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Merchant,
    Supplier,
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Merchant => UserRole::Merchant,
            Role::Supplier => UserRole::Supplier,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Conservation {
    Dry,
    Cold,
    Frozen,
    Convenience,
}

impl From<Conservation> for ConservationType {
    fn from(c: Conservation) -> Self {
        match c {
            Conservation::Dry => ConservationType::Dry,
            Conservation::Cold => ConservationType::Cold,
            Conservation::Frozen => ConservationType::Frozen,
            Conservation::Convenience => ConservationType::Convenience,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Status {
    Received,
    Shipped,
    Delivered,
}

impl From<Status> for OrderStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Received => OrderStatus::Received,
            Status::Shipped => OrderStatus::Shipped,
            Status::Delivered => OrderStatus::Delivered,
        }
    }
}

fn pesos(s: &str) -> Result<u64, String> {
    parse_pesos(s).ok_or_else(|| format!("not a peso amount: {s}"))
}

fn weekday(s: &str) -> Result<Weekday, String> {
    parse_day(s).ok_or_else(|| format!("not a day of the week: {s}"))
}

impl Command {
    fn into_request(self) -> Result<MarketRequest> {
        use MarketRequest as R;

        Ok(match self {
            Command::Register {
                email,
                role,
                business,
                department,
                locality,
            } => R::Register(RegistrationForm {
                email,
                role: role.into(),
                business_name: business,
                department,
                locality,
            }),
            Command::Login { email, role } => R::Login {
                email,
                role: role.into(),
            },
            Command::Logout => R::Logout,
            Command::Whoami => R::CurrentUser,
            Command::Catalog(args) => R::Browse(CatalogFilter {
                query: args.query,
                category: args.category,
                conservation: args.conservation.map(Into::into),
                min_price: args.min_price,
                max_price: args.max_price,
                only_on_sale: args.on_sale,
                only_in_stock: args.in_stock,
                brand: args.brand,
                department: args.department,
                locality: args.locality,
            }),
            Command::Brands => R::Brands,
            Command::Suppliers => R::Suppliers,
            Command::Cart(cmd) => match cmd {
                CartCommand::Show => R::CartSummary,
                CartCommand::Add { product } => R::AddToCart(ProductId(product)),
                CartCommand::Qty { product, delta } => R::UpdateCartQuantity {
                    product: ProductId(product),
                    delta,
                },
                CartCommand::Remove { product } => R::RemoveFromCart(ProductId(product)),
                CartCommand::Clear { supplier } => R::ClearSupplierCart(UserId(supplier)),
                CartCommand::Confirm => R::ConfirmCart,
            },
            Command::Orders(cmd) => match cmd {
                OrdersCommand::List => R::MyOrders,
                OrdersCommand::Open { order } => R::OpenOrder(OrderId(order)),
                OrdersCommand::Advance { order, status } => R::AdvanceOrder {
                    order: OrderId(order),
                    status: status.into(),
                },
                OrdersCommand::Export { order, .. } => R::ExportOrder(OrderId(order)),
                OrdersCommand::Summary => R::SalesSummary,
            },
            Command::Notifications { unread: false } => R::Notifications,
            Command::Notifications { unread: true } => R::UnreadNotifications,
            Command::Messages(cmd) => match cmd {
                MessagesCommand::Send { to, text } => R::SendMessage {
                    receiver: UserId(to),
                    text,
                },
                MessagesCommand::Read { from } => R::MarkMessagesRead(UserId(from)),
                MessagesCommand::Show { with } => R::Conversation(UserId(with)),
                MessagesCommand::List { unread: false } => R::Conversations,
                MessagesCommand::List { unread: true } => R::UnreadMessages,
            },
            Command::Products(cmd) => match cmd {
                ProductsCommand::List => R::MyProducts,
                ProductsCommand::Save(args) => R::SaveProduct(ProductDraft {
                    id: args.id.map(ProductId),
                    product_number: args.sku,
                    name: args.name,
                    description: args.description,
                    category: args.category,
                    price: args.price,
                    old_price: args.old_price,
                    brand: args.brand,
                    conservation: args.conservation.map(Into::into),
                    unit: args.unit,
                    stock: args.stock,
                    min_stock: args.min_stock,
                    is_sale: args.on_sale,
                    ..Default::default()
                }),
                ProductsCommand::Delete { ids } => R::DeleteProducts(ids.into_iter().map(ProductId).collect()),
                ProductsCommand::Import { file } => {
                    let data = std::fs::read_to_string(&file)
                        .with_context(|| format!("reading {}", file.display()))?;
                    let rows: Vec<Row> =
                        serde_json::from_str(&data).with_context(|| format!("parsing {}", file.display()))?;
                    R::ImportProducts(rows)
                }
                ProductsCommand::LowStock => R::LowStock,
            },
            Command::Coverage(cmd) => match cmd {
                CoverageCommand::Show => R::Coverage,
                CoverageCommand::Toggle { department, locality } => R::ToggleLocality { department, locality },
                CoverageCommand::Hours {
                    department,
                    locality,
                    hours,
                } => R::SetScheduleHours {
                    department,
                    locality,
                    hours,
                },
                CoverageCommand::Day {
                    department,
                    locality,
                    day,
                } => R::ToggleScheduleDay {
                    department,
                    locality,
                    day,
                },
                CoverageCommand::Apply { department, locality } => {
                    R::ApplyScheduleToDepartment { department, locality }
                }
                CoverageCommand::MinOrder { value } => R::SetMinOrderValue(value),
            },
            Command::Request { json } => parse_request(&json).context("parsing request")?,
        })
    }
}

fn setup_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mayorista=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let config_path = cli.config.unwrap_or_else(|| data_dir.join("config.json"));
    let config = load_config(&config_path)?;
    let session = load_session(&data_dir)?;
    info!(data_dir = %data_dir.display(), "starting");

    let export_to = match &cli.command {
        Command::Orders(OrdersCommand::Export { order, out: Some(out) }) => Some((out.clone(), OrderId(order.clone()))),
        _ => None,
    };
    let request = cli.command.into_request()?;

    let mut delegate = MarketDelegate::with_session(JsonFileStore::new(&data_dir), config, session);
    let response = delegate.handle_request(request);
    save_session(&data_dir, delegate.session())?;

    if let MarketResponse::Error(message) = &response {
        bail!("{message}");
    }

    if let (Some((path, id)), MarketResponse::Export(rows)) = (export_to, &response) {
        // A directory target gets the conventional file name.
        let target = if path.is_dir() {
            let order = delegate.my_orders()?.into_iter().find(|o| o.id == id);
            match order {
                Some(order) => path.join(export_file_name(&order)),
                None => path.join(format!("Pedido_{id}.json")),
            }
        } else {
            path
        };
        let data = serde_json::to_string_pretty(rows).context("serializing export")?;
        std::fs::write(&target, data).with_context(|| format!("writing {}", target.display()))?;
        info!(path = %target.display(), "order exported");
    }

    let output = serde_json::to_string_pretty(&response_json(&response)).context("rendering response")?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_draft(args: &[&str]) -> ProductDraft {
        let cli = Cli::try_parse_from(["mayorista", "products", "save"].iter().chain(args)).unwrap();
        match cli.command.into_request().unwrap() {
            MarketRequest::SaveProduct(draft) => draft,
            other => panic!("Expected SaveProduct, got {:?}", other),
        }
    }

    #[test]
    fn product_edit_sends_only_given_fields() {
        let draft = save_draft(&["--id", "p-1", "--price", "95"]);
        assert_eq!(draft.id, Some(ProductId("p-1".into())));
        assert_eq!(draft.price, Some(9_500));
        assert_eq!(draft.name, None);
        assert_eq!(draft.is_sale, None);

        assert_eq!(save_draft(&["--id", "p-1", "--on-sale", "false"]).is_sale, Some(false));
    }
}
