use gatepass_engine::{
    db_types::{EmailAddress, GateEntry, NewTicket, Role, Roles, Ticket, TicketId, TicketStatus},
    traits::{AuthApiError, AuthManagement, TicketStore, TicketStoreError},
};
use mockall::mock;

use crate::integrations::{
    IdentityApiError,
    IdentityProvider,
    StudentIdCheck,
    UtrExtraction,
    VisionApiError,
    VisionExtractor,
};

mock! {
    pub TicketDb {}
    impl TicketStore for TicketDb {
        fn url(&self) -> &str;
        async fn insert_ticket(&self, ticket: NewTicket, ticket_id: &TicketId, initial_status: TicketStatus) -> Result<Ticket, TicketStoreError>;
        async fn fetch_ticket_by_ticket_id(&self, ticket_id: &TicketId) -> Result<Option<Ticket>, TicketStoreError>;
        async fn fetch_tickets_by_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, TicketStoreError>;
        async fn update_status_if(&self, ticket_id: &TicketId, expected: TicketStatus, new_status: TicketStatus) -> Result<Option<Ticket>, TicketStoreError>;
        async fn redeem_ticket(&self, ticket_id: &TicketId, entry: GateEntry) -> Result<Option<Ticket>, TicketStoreError>;
    }
}

mock! {
    pub AuthDb {}
    impl AuthManagement for AuthDb {
        async fn upsert_auth_account(&self, email: &EmailAddress) -> Result<(), AuthApiError>;
        async fn fetch_roles_for_email(&self, email: &EmailAddress) -> Result<Roles, AuthApiError>;
        async fn assign_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<(), AuthApiError>;
        async fn remove_roles(&self, email: &EmailAddress, roles: &[Role]) -> Result<u64, AuthApiError>;
    }
}

mock! {
    pub Identity {}
    impl IdentityProvider for Identity {
        async fn send_otp(&self, email: &EmailAddress) -> Result<(), IdentityApiError>;
        async fn verify_otp(&self, email: &EmailAddress, otp: &str) -> Result<(), IdentityApiError>;
    }
}

mock! {
    pub Vision {}
    impl VisionExtractor for Vision {
        async fn extract_utr(&self, image_b64: &str, mime_type: &str) -> Result<UtrExtraction, VisionApiError>;
        async fn verify_student_id(&self, image_b64: &str, mime_type: &str) -> Result<StudentIdCheck, VisionApiError>;
    }
}
