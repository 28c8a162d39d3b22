// Route modules for the Palaver server
pub mod websocket; // Signaling transport endpoint
