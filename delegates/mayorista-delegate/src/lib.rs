use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use mayorista_common::cart::{Cart, SupplierGroup};
use mayorista_common::catalog::{self, CatalogFilter, ProductGroup};
use mayorista_common::coverage::{Coverage, CoverageEditor, DeliverySchedule, HourRange};
use mayorista_common::currency::pesos;
use mayorista_common::export::{export_order, ExportRow};
use mayorista_common::identity::{RegistrationForm, User, UserId, UserRole};
use mayorista_common::import::{import_rows, Row};
use mayorista_common::message::{self, ConversationSummary, Message};
use mayorista_common::notification::{self, Notification};
use mayorista_common::order::{Order, OrderId, OrderStatus, SalesSummary};
use mayorista_common::product::{Product, ProductDraft, ProductId};
use mayorista_common::store::{self, Partition, Store};
use mayorista_common::{MarketConfig, MarketError, StoreError};

/// Requests that can be sent to the marketplace delegate.
#[derive(Debug, Serialize, Deserialize)]
pub enum MarketRequest {
    // Session
    Register(RegistrationForm),
    Login { email: String, role: UserRole },
    Logout,
    CurrentUser,

    // Catalog
    Browse(CatalogFilter),
    Brands,
    Suppliers,

    // Cart
    AddToCart(ProductId),
    UpdateCartQuantity { product: ProductId, delta: i64 },
    RemoveFromCart(ProductId),
    ClearSupplierCart(UserId),
    CartSummary,
    ConfirmCart,

    // Orders
    OpenOrder(OrderId),
    AdvanceOrder { order: OrderId, status: OrderStatus },
    MyOrders,
    SalesSummary,
    ExportOrder(OrderId),

    // Notifications
    Notifications,
    UnreadNotifications,

    // Messaging
    SendMessage { receiver: UserId, text: String },
    MarkMessagesRead(UserId),
    Conversation(UserId),
    Conversations,
    UnreadMessages,

    // Inventory
    MyProducts,
    SaveProduct(ProductDraft),
    DeleteProducts(Vec<ProductId>),
    ImportProducts(Vec<Row>),
    LowStock,

    // Coverage
    Coverage,
    ToggleLocality { department: String, locality: String },
    SetScheduleHours { department: String, locality: String, hours: HourRange },
    ToggleScheduleDay { department: String, locality: String, day: Weekday },
    ApplyScheduleToDepartment { department: String, locality: String },
    SetMinOrderValue(#[serde(with = "pesos::option")] Option<u64>),
}

/// Responses from the marketplace delegate.
#[derive(Debug, Serialize, Deserialize)]
pub enum MarketResponse {
    User(User),
    Users(Vec<User>),
    LoggedOut,
    Groups(Vec<ProductGroup>),
    Brands(Vec<String>),
    Quantity(u32),
    Removed(bool),
    Count(usize),
    Cart(CartSummary),
    Order(Order),
    Orders(Vec<Order>),
    Sales(SalesSummary),
    Export(Vec<ExportRow>),
    Notifications(Vec<Notification>),
    Message(Message),
    Messages(Vec<Message>),
    Conversations(Vec<ConversationSummary>),
    Product(Product),
    Products(Vec<Product>),
    Coverage(Coverage),
    Selected(bool),
    Schedule(DeliverySchedule),
    Error(String),
}

/// What the cart drawer shows: per-supplier groups and the grand totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub groups: Vec<SupplierGroup>,
    #[serde(with = "pesos")]
    pub total: u64,
    pub item_count: u64,
}

/// Per-client state: who is logged in and what they are about to order.
/// Never written to the shared store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub cart: Cart,
}

/// One client's view of the marketplace, backed by a shared store.
pub struct MarketDelegate<S: Store> {
    store: S,
    config: MarketConfig,
    session: Session,
}

impl<S: Store> MarketDelegate<S> {
    pub fn new(store: S, config: MarketConfig) -> Self {
        Self::with_session(store, config, Session::default())
    }

    /// Resume a previously saved session.
    pub fn with_session(store: S, config: MarketConfig, session: Session) -> Self {
        Self {
            store,
            config,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, Session) {
        (self.store, self.session)
    }

    pub fn handle_request(&mut self, request: MarketRequest) -> MarketResponse {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "request rejected");
                MarketResponse::Error(e.to_string())
            }
        }
    }

    fn dispatch(&mut self, request: MarketRequest) -> Result<MarketResponse, MarketError> {
        use MarketRequest as R;
        use MarketResponse as A;

        Ok(match request {
            R::Register(form) => A::User(self.register(&form)?),
            R::Login { email, role } => A::User(self.login(&email, role)?),
            R::Logout => {
                self.logout();
                A::LoggedOut
            }
            R::CurrentUser => A::User(self.current_user()?),

            R::Browse(filter) => A::Groups(self.browse(&filter)?),
            R::Brands => A::Brands(self.brands()?),
            R::Suppliers => A::Users(self.suppliers()?),

            R::AddToCart(id) => A::Quantity(self.add_to_cart(&id)?),
            R::UpdateCartQuantity { product, delta } => A::Quantity(self.update_cart_quantity(&product, delta)?),
            R::RemoveFromCart(id) => A::Removed(self.remove_from_cart(&id)?),
            R::ClearSupplierCart(supplier) => A::Count(self.clear_supplier_cart(&supplier)?),
            R::CartSummary => A::Cart(self.cart_summary()?),
            R::ConfirmCart => A::Orders(self.confirm_cart()?),

            R::OpenOrder(id) => A::Order(self.open_order(&id)?),
            R::AdvanceOrder { order, status } => A::Order(self.advance_order(&order, status)?),
            R::MyOrders => A::Orders(self.my_orders()?),
            R::SalesSummary => A::Sales(self.sales_summary()?),
            R::ExportOrder(id) => A::Export(self.export_order(&id)?),

            R::Notifications => A::Notifications(self.notifications()?),
            R::UnreadNotifications => A::Count(self.unread_notifications()?),

            R::SendMessage { receiver, text } => A::Message(self.send_message(&receiver, &text)?),
            R::MarkMessagesRead(sender) => A::Count(self.mark_messages_read(&sender)?),
            R::Conversation(partner) => A::Messages(self.conversation(&partner)?),
            R::Conversations => A::Conversations(self.conversations()?),
            R::UnreadMessages => A::Count(self.unread_messages()?),

            R::MyProducts => A::Products(self.my_products()?),
            R::SaveProduct(draft) => A::Product(self.save_product(draft)?),
            R::DeleteProducts(ids) => A::Count(self.delete_products(&ids)?),
            R::ImportProducts(rows) => A::Products(self.import_products(&rows)?),
            R::LowStock => A::Products(self.low_stock()?),

            R::Coverage => A::Coverage(self.coverage_editor()?.into_coverage()),
            R::ToggleLocality { department, locality } => A::Selected(self.toggle_locality(&department, &locality)?),
            R::SetScheduleHours {
                department,
                locality,
                hours,
            } => A::Schedule(self.set_schedule_hours(&department, &locality, hours)?),
            R::ToggleScheduleDay {
                department,
                locality,
                day,
            } => A::Schedule(self.toggle_schedule_day(&department, &locality, day)?),
            R::ApplyScheduleToDepartment { department, locality } => {
                A::Count(self.apply_schedule_to_department(&department, &locality)?)
            }
            R::SetMinOrderValue(value) => A::User(self.set_min_order_value(value)?),
        })
    }

    // --- Session ---

    /// Create an account and log it in. Emails are unique across roles.
    pub fn register(&mut self, form: &RegistrationForm) -> Result<User, MarketError> {
        let user = User::register(form, now())?;
        store::modify(&mut self.store, Partition::Users, |users: &mut Vec<User>| {
            if users.iter().any(|u| u.has_email(&user.email)) {
                return Err(MarketError::AlreadyRegistered(user.email.clone()));
            }
            users.push(user.clone());
            Ok(())
        })?;
        info!(user = %user.id, role = %user.role, "registered");
        self.start_session(&user);
        Ok(user)
    }

    pub fn login(&mut self, email: &str, role: UserRole) -> Result<User, MarketError> {
        let user = self
            .users()?
            .into_iter()
            .find(|u| u.role == role && u.has_email(email))
            .ok_or_else(|| MarketError::UserNotFound {
                email: email.trim().to_string(),
                role,
            })?;
        info!(user = %user.id, "logged in");
        self.start_session(&user);
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let Some(id) = self.session.user_id.take() {
            info!(user = %id, "logged out");
        }
        self.session.cart.clear();
    }

    /// The logged-in user as currently stored.
    pub fn current_user(&self) -> Result<User, MarketError> {
        let id = self.session.user_id.as_ref().ok_or(MarketError::NotLoggedIn)?;
        self.users()?
            .into_iter()
            .find(|u| &u.id == id)
            .ok_or_else(|| MarketError::UnknownUser(id.clone()))
    }

    fn start_session(&mut self, user: &User) {
        self.session = Session {
            user_id: Some(user.id.clone()),
            cart: Cart::default(),
        };
    }

    fn require(&self, role: UserRole) -> Result<User, MarketError> {
        let user = self.current_user()?;
        if user.role != role {
            return Err(MarketError::WrongRole { required: role });
        }
        Ok(user)
    }

    fn users(&self) -> Result<Vec<User>, StoreError> {
        Ok(store::load(&self.store, Partition::Users)?.records)
    }

    fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(store::load(&self.store, Partition::Products)?.records)
    }

    fn orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(store::load(&self.store, Partition::Orders)?.records)
    }

    fn messages(&self) -> Result<Vec<Message>, StoreError> {
        Ok(store::load(&self.store, Partition::Messages)?.records)
    }

    /// Apply `f` to the logged-in user's stored record.
    fn update_current_user<R>(&mut self, f: impl FnOnce(&mut User) -> Result<R, MarketError>) -> Result<R, MarketError> {
        let id = self.session.user_id.clone().ok_or(MarketError::NotLoggedIn)?;
        store::modify(&mut self.store, Partition::Users, |users: &mut Vec<User>| {
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| MarketError::UnknownUser(id.clone()))?;
            f(user)
        })
    }

    // --- Catalog ---

    pub fn browse(&self, filter: &CatalogFilter) -> Result<Vec<ProductGroup>, MarketError> {
        let products = self.products()?;
        let users = self.users()?;
        let groups = catalog::browse(&products, &users, filter);
        debug!(groups = groups.len(), "catalog browsed");
        Ok(groups)
    }

    pub fn brands(&self) -> Result<Vec<String>, MarketError> {
        Ok(catalog::brands(&self.products()?))
    }

    pub fn suppliers(&self) -> Result<Vec<User>, MarketError> {
        Ok(self.users()?.into_iter().filter(User::is_supplier).collect())
    }

    // --- Cart ---

    /// Add one unit of a catalog product. Returns the new line quantity.
    pub fn add_to_cart(&mut self, id: &ProductId) -> Result<u32, MarketError> {
        self.require(UserRole::Merchant)?;
        let product = self
            .products()?
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| MarketError::ProductNotFound(id.0.clone()))?;
        self.session.cart.add(&product)
    }

    pub fn update_cart_quantity(&mut self, id: &ProductId, delta: i64) -> Result<u32, MarketError> {
        self.session.cart.update_quantity(id, delta)
    }

    pub fn remove_from_cart(&mut self, id: &ProductId) -> Result<bool, MarketError> {
        Ok(self.session.cart.remove(id))
    }

    pub fn clear_supplier_cart(&mut self, supplier: &UserId) -> Result<usize, MarketError> {
        Ok(self.session.cart.clear_supplier(supplier))
    }

    pub fn cart_summary(&self) -> Result<CartSummary, MarketError> {
        let users = self.users()?;
        let cart = &self.session.cart;
        Ok(CartSummary {
            groups: cart.groups(&users, self.config.default_min_order_value),
            total: cart.total(),
            item_count: cart.item_count(),
        })
    }

    /// Turn the cart into one pending order per supplier and notify each
    /// supplier. The cart is emptied on success.
    pub fn confirm_cart(&mut self) -> Result<Vec<Order>, MarketError> {
        let merchant = self.require(UserRole::Merchant)?;
        if self.session.cart.is_empty() {
            return Err(MarketError::EmptyCart);
        }
        let users = self.users()?;
        for group in self.session.cart.groups(&users, self.config.default_min_order_value) {
            if group.below_minimum {
                warn!(
                    supplier = %group.supplier_id,
                    subtotal = group.subtotal,
                    minimum = group.minimum,
                    "order below supplier minimum"
                );
            }
        }

        let now = now();
        let orders: Vec<Order> = self
            .session
            .cart
            .partition()
            .into_iter()
            .map(|(supplier, items)| {
                Order::place(
                    supplier,
                    merchant.id.clone(),
                    Some(merchant.business_name.clone()),
                    items,
                    now,
                )
            })
            .collect();
        let received: Vec<Notification> = orders
            .iter()
            .map(|order| Notification::order_received(order, &merchant.business_name, now))
            .collect();

        store::modify(&mut self.store, Partition::Orders, |all: &mut Vec<Order>| {
            all.extend(orders.iter().cloned());
            Ok::<_, MarketError>(())
        })?;
        let notified = store::modify(&mut self.store, Partition::Notifications, |all: &mut Vec<Notification>| {
            for notification in &received {
                all.insert(0, notification.clone());
            }
            Ok::<_, MarketError>(())
        });
        if let Err(e) = notified {
            // The cart stays intact so the merchant can confirm again.
            let ids: Vec<OrderId> = orders.iter().map(|o| o.id.clone()).collect();
            self.withdraw_orders(&ids);
            return Err(e);
        }

        for order in &orders {
            info!(order = %order.id, supplier = %order.supplier_id, total = order.total, "order placed");
        }
        self.session.cart.clear();
        Ok(orders)
    }

    // --- Orders ---

    /// View an order. Clears the viewer's notifications about it; the first
    /// time its supplier opens it, the merchant is told.
    pub fn open_order(&mut self, id: &OrderId) -> Result<Order, MarketError> {
        let viewer = self.current_user()?;
        let now = now();
        let (order, first_view) = store::modify(&mut self.store, Partition::Orders, |all: &mut Vec<Order>| {
            let order = all
                .iter_mut()
                .find(|o| &o.id == id && o.involves(&viewer.id))
                .ok_or_else(|| MarketError::OrderNotFound(id.0.clone()))?;
            let first_view = order.supplier_id == viewer.id && !order.is_read_by_supplier;
            if first_view {
                order.is_read_by_supplier = true;
            }
            Ok::<_, MarketError>((order.clone(), first_view))
        })?;

        let opened = Notification::order_opened(&order, &viewer.business_name, now);
        let notified = store::modify(&mut self.store, Partition::Notifications, |all: &mut Vec<Notification>| {
            let cleared = notification::mark_order_read(all, &viewer.id, id);
            debug!(order = %id, cleared, "order notifications read");
            if first_view {
                all.insert(0, opened);
            }
            Ok::<_, MarketError>(())
        });
        if let Err(e) = notified {
            if first_view {
                // Leave the order unread so the next view tells the merchant.
                self.revert_order(id, |o| o.is_read_by_supplier = false);
            }
            return Err(e);
        }
        if first_view {
            info!(order = %id, "order opened by supplier");
        }
        Ok(order)
    }

    /// Move an order forward and tell the merchant.
    pub fn advance_order(&mut self, id: &OrderId, status: OrderStatus) -> Result<Order, MarketError> {
        let supplier = self.require(UserRole::Supplier)?;
        let (order, previous) = store::modify(&mut self.store, Partition::Orders, |all: &mut Vec<Order>| {
            let order = all
                .iter_mut()
                .find(|o| &o.id == id && o.supplier_id == supplier.id)
                .ok_or_else(|| MarketError::OrderNotFound(id.0.clone()))?;
            if !order.status.can_transition_to(status) {
                return Err(MarketError::InvalidTransition {
                    from: order.status,
                    to: status,
                });
            }
            let previous = order.status;
            order.status = status;
            Ok((order.clone(), previous))
        })?;
        let changed = Notification::order_status(&order, status, now());
        let notified = store::modify(&mut self.store, Partition::Notifications, |all: &mut Vec<Notification>| {
            all.insert(0, changed);
            Ok::<_, MarketError>(())
        });
        if let Err(e) = notified {
            self.revert_order(id, |o| o.status = previous);
            return Err(e);
        }
        info!(order = %id, %status, "order advanced");
        Ok(order)
    }

    /// Drop orders whose notifications could not be written.
    fn withdraw_orders(&mut self, ids: &[OrderId]) {
        let withdrawn = store::modify(&mut self.store, Partition::Orders, |all: &mut Vec<Order>| {
            all.retain(|o| !ids.contains(&o.id));
            Ok::<_, StoreError>(())
        });
        if let Err(e) = withdrawn {
            error!(error = %e, orders = ids.len(), "could not withdraw unannounced orders");
        }
    }

    /// Undo an order edit whose notification could not be written.
    fn revert_order(&mut self, id: &OrderId, undo: impl FnOnce(&mut Order)) {
        let reverted = store::modify(&mut self.store, Partition::Orders, |all: &mut Vec<Order>| {
            if let Some(order) = all.iter_mut().find(|o| &o.id == id) {
                undo(order);
            }
            Ok::<_, StoreError>(())
        });
        if let Err(e) = reverted {
            error!(order = %id, error = %e, "could not revert order");
        }
    }

    /// Orders placed by (merchant) or addressed to (supplier) the current
    /// user, newest first.
    pub fn my_orders(&self) -> Result<Vec<Order>, MarketError> {
        let user = self.current_user()?;
        let mut mine: Vec<Order> = self
            .orders()?
            .into_iter()
            .filter(|o| match user.role {
                UserRole::Supplier => o.supplier_id == user.id,
                UserRole::Merchant => o.merchant_id == user.id,
            })
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    pub fn sales_summary(&self) -> Result<SalesSummary, MarketError> {
        let supplier = self.require(UserRole::Supplier)?;
        Ok(SalesSummary::for_supplier(&self.orders()?, &supplier.id))
    }

    pub fn export_order(&self, id: &OrderId) -> Result<Vec<ExportRow>, MarketError> {
        let user = self.current_user()?;
        self.orders()?
            .iter()
            .find(|o| &o.id == id && o.involves(&user.id))
            .map(export_order)
            .ok_or_else(|| MarketError::OrderNotFound(id.0.clone()))
    }

    // --- Notifications ---

    pub fn notifications(&self) -> Result<Vec<Notification>, MarketError> {
        let user = self.current_user()?;
        let all: Vec<Notification> = store::load(&self.store, Partition::Notifications)?.records;
        Ok(notification::for_receiver(&all, &user.id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn unread_notifications(&self) -> Result<usize, MarketError> {
        let user = self.current_user()?;
        let all: Vec<Notification> = store::load(&self.store, Partition::Notifications)?.records;
        Ok(notification::unread_count(&all, &user.id))
    }

    // --- Messaging ---

    pub fn send_message(&mut self, receiver: &UserId, text: &str) -> Result<Message, MarketError> {
        let sender = self.current_user()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(MarketError::EmptyMessage);
        }
        if !self.users()?.iter().any(|u| &u.id == receiver) {
            return Err(MarketError::UnknownUser(receiver.clone()));
        }
        let msg = Message::new(&sender.id, receiver, text, now());
        store::modify(&mut self.store, Partition::Messages, |all: &mut Vec<Message>| {
            all.push(msg.clone());
            Ok::<_, MarketError>(())
        })?;
        debug!(from = %sender.id, to = %receiver, "message sent");
        Ok(msg)
    }

    pub fn mark_messages_read(&mut self, sender: &UserId) -> Result<usize, MarketError> {
        let reader = self.current_user()?;
        store::modify(&mut self.store, Partition::Messages, |all: &mut Vec<Message>| {
            Ok(message::mark_read(all, &reader.id, sender))
        })
    }

    /// Open the chat with `partner`: their messages are marked read and the
    /// whole thread is returned oldest first.
    pub fn conversation(&mut self, partner: &UserId) -> Result<Vec<Message>, MarketError> {
        let me = self.current_user()?;
        if self.mark_messages_read(partner)? > 0 {
            debug!(partner = %partner, "conversation read");
        }
        let all = self.messages()?;
        Ok(message::conversation(&all, &me.id, partner)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn conversations(&self) -> Result<Vec<ConversationSummary>, MarketError> {
        let me = self.current_user()?;
        Ok(message::conversations(&self.messages()?, &me.id))
    }

    pub fn unread_messages(&self) -> Result<usize, MarketError> {
        let me = self.current_user()?;
        Ok(message::unread_count(&self.messages()?, &me.id))
    }

    // --- Inventory ---

    pub fn my_products(&self) -> Result<Vec<Product>, MarketError> {
        let supplier = self.require(UserRole::Supplier)?;
        Ok(self
            .products()?
            .into_iter()
            .filter(|p| p.supplier_id == supplier.id)
            .collect())
    }

    /// Create a product, or edit one of the supplier's own products when the
    /// draft carries its id. An edit only touches the fields the draft sets.
    pub fn save_product(&mut self, draft: ProductDraft) -> Result<Product, MarketError> {
        let supplier = self.require(UserRole::Supplier)?;
        let now = now();
        let (product, is_new) = store::modify(&mut self.store, Partition::Products, |all: &mut Vec<Product>| {
            let position = draft.id.as_ref().and_then(|id| all.iter().position(|p| &p.id == id));
            match position {
                Some(i) if all[i].supplier_id == supplier.id => {
                    draft.apply_to(&mut all[i]);
                    Ok((all[i].clone(), false))
                }
                Some(i) => Err(MarketError::ProductNotFound(all[i].id.0.clone())),
                None => {
                    let product = draft.into_product(&supplier.id, now);
                    all.push(product.clone());
                    Ok((product, true))
                }
            }
        })?;
        info!(product = %product.id, new = is_new, "product saved");

        if self.config.notify_low_stock && product.is_low_stock() {
            // The product is already saved; a lost alert must not fail the save.
            let alerted = store::modify(&mut self.store, Partition::Notifications, |all: &mut Vec<Notification>| {
                all.insert(0, Notification::low_stock(&product, now));
                Ok::<_, StoreError>(())
            });
            if let Err(e) = alerted {
                warn!(product = %product.id, error = %e, "low stock notification not written");
            }
        }
        Ok(product)
    }

    /// Delete the supplier's own products among `ids`. Returns how many went.
    pub fn delete_products(&mut self, ids: &[ProductId]) -> Result<usize, MarketError> {
        let supplier = self.require(UserRole::Supplier)?;
        let removed = store::modify(&mut self.store, Partition::Products, |all: &mut Vec<Product>| {
            let before = all.len();
            all.retain(|p| !(p.supplier_id == supplier.id && ids.contains(&p.id)));
            Ok::<_, MarketError>(before - all.len())
        })?;
        info!(removed, "products deleted");
        Ok(removed)
    }

    /// Append the products described by spreadsheet rows. Nothing is added if
    /// any row is malformed.
    pub fn import_products(&mut self, rows: &[Row]) -> Result<Vec<Product>, MarketError> {
        let supplier = self.require(UserRole::Supplier)?;
        let imported = import_rows(rows, &supplier.id, now()).inspect_err(|e| {
            warn!(error = %e, "import rejected");
        })?;
        store::modify(&mut self.store, Partition::Products, |all: &mut Vec<Product>| {
            all.extend(imported.iter().cloned());
            Ok::<_, MarketError>(())
        })?;
        info!(count = imported.len(), "products imported");
        Ok(imported)
    }

    pub fn low_stock(&self) -> Result<Vec<Product>, MarketError> {
        Ok(self
            .my_products()?
            .into_iter()
            .filter(Product::is_low_stock)
            .collect())
    }

    // --- Coverage ---

    /// An editor over the supplier's stored coverage.
    pub fn coverage_editor(&self) -> Result<CoverageEditor, MarketError> {
        let supplier = self.require(UserRole::Supplier)?;
        Ok(CoverageEditor::new(
            supplier.coverage.unwrap_or_default(),
            self.config.default_delivery_hours,
        ))
    }

    /// Run `edit` against the supplier's coverage and persist the result.
    fn edit_coverage<R>(
        &mut self,
        edit: impl FnOnce(&mut CoverageEditor) -> Result<R, MarketError>,
    ) -> Result<R, MarketError> {
        self.require(UserRole::Supplier)?;
        let default_hours = self.config.default_delivery_hours;
        let out = self.update_current_user(|user| {
            let mut editor = CoverageEditor::new(user.coverage.take().unwrap_or_default(), default_hours);
            let result = edit(&mut editor);
            user.coverage = Some(editor.into_coverage());
            result
        })?;
        info!("coverage updated");
        Ok(out)
    }

    pub fn toggle_locality(&mut self, department: &str, locality: &str) -> Result<bool, MarketError> {
        self.edit_coverage(|editor| editor.toggle_locality(department, locality))
    }

    pub fn set_schedule_hours(
        &mut self,
        department: &str,
        locality: &str,
        hours: HourRange,
    ) -> Result<DeliverySchedule, MarketError> {
        self.edit_coverage(|editor| {
            editor.focus(department, locality)?;
            editor.set_hours(hours)?;
            Ok(editor.temp_schedule().clone())
        })
    }

    pub fn toggle_schedule_day(
        &mut self,
        department: &str,
        locality: &str,
        day: Weekday,
    ) -> Result<DeliverySchedule, MarketError> {
        self.edit_coverage(|editor| {
            editor.focus(department, locality)?;
            editor.toggle_day(day)?;
            Ok(editor.temp_schedule().clone())
        })
    }

    /// Copy `locality`'s schedule to every selected locality of `department`.
    pub fn apply_schedule_to_department(&mut self, department: &str, locality: &str) -> Result<usize, MarketError> {
        self.edit_coverage(|editor| {
            editor.focus(department, locality)?;
            editor.apply_to_department(department)
        })
    }

    pub fn set_min_order_value(&mut self, value: Option<u64>) -> Result<User, MarketError> {
        self.require(UserRole::Supplier)?;
        let user = self.update_current_user(|user| {
            user.min_order_value = value;
            Ok(user.clone())
        })?;
        info!(minimum = ?value, "minimum order updated");
        Ok(user)
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Decode a request from JSON, for callers that speak the wire format.
pub fn parse_request(json: &str) -> Result<MarketRequest, serde_json::Error> {
    serde_json::from_str(json)
}

/// Render a response as JSON.
pub fn response_json(response: &MarketResponse) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| Value::String(e.to_string()))
}
