// Customer records. The booking path only ever consumes this through
// the CustomerLookup trait; from the engine's point of view the
// directory is an external collaborator that resolves email addresses.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tracing::info;

use crate::model::{Customer, ValidationError};

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("a customer with the email address {0:?} already exists")]
    DuplicateEmail(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// The single contract the booking path requires from customer storage.
pub trait CustomerLookup: Send + Sync {
    fn find_customer(&self, email: &str) -> Option<Arc<Customer>>;
}

#[derive(Debug, Default)]
pub struct CustomerDirectory {
    customers: DashMap<String, Arc<Customer>>,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
        }
    }

    // Validates and registers a new customer. The email is the identity
    // and must be unused.
    pub fn add_customer(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Arc<Customer>, DirectoryError> {
        let customer = Arc::new(Customer::new(first_name, last_name, email)?);
        match self.customers.entry(customer.email().to_owned()) {
            Entry::Occupied(_) => Err(DirectoryError::DuplicateEmail(customer.email().to_owned())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&customer));
                info!(email = %customer.email(), "created customer account");
                Ok(customer)
            }
        }
    }

    pub fn find_customer(&self, email: &str) -> Option<Arc<Customer>> {
        self.customers
            .get(email)
            .map(|entry| Arc::clone(entry.value()))
    }

    // Snapshot of all known customers. Iteration order is unspecified.
    pub fn customers(&self) -> Vec<Arc<Customer>> {
        self.customers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl CustomerLookup for CustomerDirectory {
    fn find_customer(&self, email: &str) -> Option<Arc<Customer>> {
        CustomerDirectory::find_customer(self, email)
    }
}
