pub mod mock_proxy;
