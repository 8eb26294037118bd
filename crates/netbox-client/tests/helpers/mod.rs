pub mod mock_netbox_server;
