pub mod shared {
    pub mod core {
        pub mod auth;
        pub mod bulk;
        pub mod errors;
        pub mod money;
        pub mod patch;
    }
    pub mod infrastructure {
        pub mod store;
    }
}

pub mod modules {
    pub mod time_entries {
        pub mod domain;
        pub mod use_cases {
            pub mod approve_entries;
            pub mod create_entry;
            pub mod delete_entry;
            pub mod list_entries;
            pub mod reject_entries;
            pub mod submit_entries;
            pub mod track_timer;
            pub mod update_entry;
        }
        pub mod inbound {
            pub mod http;
        }
    }
    pub mod invoices {
        pub mod domain;
        pub mod use_cases {
            pub mod create_invoice;
            pub mod list_invoices;
            pub mod record_payment;
            pub mod update_invoice;
            pub mod update_invoice_status;
        }
        pub mod inbound {
            pub mod http;
        }
    }
    pub mod summaries {
        pub mod domain;
        pub mod user_directory;
        pub mod use_cases {
            pub mod daily_summary;
            pub mod weekly_overview;
        }
        pub mod inbound {
            pub mod http;
        }
    }
}

pub mod shell;
