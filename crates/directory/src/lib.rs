//! `anchorcrm-directory` — people and companies.
//!
//! Business entities following the uniform recipe: requests, rule sets,
//! handlers over the repository contracts, tiered projections with resolved
//! reference labels and derived counts.

pub mod company;
pub mod person;

pub use company::{
    Company, CompanyDetails, CompanyHandlers, CompanyListItem, CompanySummary, CreateCompany,
    DeleteCompany, GetCompanyById, ListCompanies, UpdateCompany,
};
pub use person::{
    CreatePerson, DeletePerson, GetPersonById, ListPeople, Person, PersonDetails, PersonHandlers,
    PersonListItem, PersonSummary, UpdatePerson,
};
